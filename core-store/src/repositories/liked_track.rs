//! Liked-track repository trait and implementation
//!
//! Rows are append-only facts; the reconciliation engine deletes rows by id
//! when the remote library shrinks or duplicates are detected.

use crate::error::{Result, StoreError};
use crate::models::{LikedEntry, LikedTrack, MonthCount, YearCount};
use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use sqlx::{query_as, SqlitePool};

/// Liked-track repository interface
#[async_trait]
pub trait LikedTrackRepository: Send + Sync {
    /// Append a liked row. Year and month are derived from `added_at`.
    async fn insert(&self, user_row_id: i64, track_row_id: i64, added_at: i64) -> Result<()>;

    /// Number of liked rows for a user
    async fn count_for_user(&self, user_row_id: i64) -> Result<i64>;

    /// Distinct remote track ids the user has liked, joined through tracks
    async fn remote_ids_for_user(&self, user_row_id: i64) -> Result<Vec<String>>;

    /// Remote track ids liked in one month, earliest liked first
    async fn remote_ids_for_month(
        &self,
        user_row_id: i64,
        year: i32,
        month: i32,
    ) -> Result<Vec<String>>;

    /// One page of liked rows in library order (most recently liked first)
    async fn page_in_remote_order(
        &self,
        user_row_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LikedEntry>>;

    /// Track row ids that appear on more than one liked row for the user
    async fn duplicate_track_ids(&self, user_row_id: i64) -> Result<Vec<i64>>;

    /// All liked rows for one (user, track) pair, earliest added first
    async fn rows_for_track(&self, user_row_id: i64, track_row_id: i64) -> Result<Vec<LikedTrack>>;

    /// Delete liked rows by row id; returns the number deleted
    async fn delete_rows(&self, ids: &[i64]) -> Result<u64>;

    /// Delete all liked rows for one (user, track) pair; returns the number deleted
    async fn delete_for_track(&self, user_row_id: i64, track_row_id: i64) -> Result<u64>;

    /// Likes per year, most recent year first
    async fn liked_years(&self, user_row_id: i64) -> Result<Vec<YearCount>>;

    /// Likes per month, most recent first, optionally restricted to a year
    async fn liked_months(&self, user_row_id: i64, year: Option<i32>) -> Result<Vec<MonthCount>>;
}

/// SQLite implementation of LikedTrackRepository
pub struct SqliteLikedTrackRepository {
    pool: SqlitePool,
}

impl SqliteLikedTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikedTrackRepository for SqliteLikedTrackRepository {
    async fn insert(&self, user_row_id: i64, track_row_id: i64, added_at: i64) -> Result<()> {
        let timestamp =
            DateTime::from_timestamp(added_at, 0).ok_or_else(|| StoreError::InvalidInput {
                field: "added_at",
                message: format!("out-of-range timestamp {added_at}"),
            })?;

        sqlx::query(
            r#"
            INSERT INTO liked_tracks (user_id, track_id, added_at, year, month)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_row_id)
        .bind(track_row_id)
        .bind(added_at)
        .bind(timestamp.year())
        .bind(timestamp.month() as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_for_user(&self, user_row_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM liked_tracks WHERE user_id = ?")
            .bind(user_row_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn remote_ids_for_user(&self, user_row_id: i64) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT t.track_id
            FROM liked_tracks lt
            JOIN tracks t ON t.id = lt.track_id
            WHERE lt.user_id = ?
            "#,
        )
        .bind(user_row_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn remote_ids_for_month(
        &self,
        user_row_id: i64,
        year: i32,
        month: i32,
    ) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.track_id
            FROM liked_tracks lt
            JOIN tracks t ON t.id = lt.track_id
            WHERE lt.user_id = ? AND lt.year = ? AND lt.month = ?
            ORDER BY lt.added_at ASC, lt.id ASC
            "#,
        )
        .bind(user_row_id)
        .bind(year)
        .bind(month)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn page_in_remote_order(
        &self,
        user_row_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LikedEntry>> {
        let entries = query_as::<_, LikedEntry>(
            r#"
            SELECT
                lt.id AS liked_id,
                t.id AS track_row_id,
                t.track_id AS track_id,
                t.name AS name,
                lt.added_at AS added_at
            FROM liked_tracks lt
            JOIN tracks t ON t.id = lt.track_id
            WHERE lt.user_id = ?
            ORDER BY lt.added_at DESC, lt.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_row_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn duplicate_track_ids(&self, user_row_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT track_id
            FROM liked_tracks
            WHERE user_id = ?
            GROUP BY track_id
            HAVING COUNT(*) > 1
            "#,
        )
        .bind(user_row_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn rows_for_track(
        &self,
        user_row_id: i64,
        track_row_id: i64,
    ) -> Result<Vec<LikedTrack>> {
        let rows = query_as::<_, LikedTrack>(
            r#"
            SELECT * FROM liked_tracks
            WHERE user_id = ? AND track_id = ?
            ORDER BY added_at ASC, id ASC
            "#,
        )
        .bind(user_row_id)
        .bind(track_row_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete_rows(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM liked_tracks WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_for_track(&self, user_row_id: i64, track_row_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM liked_tracks WHERE user_id = ? AND track_id = ?")
            .bind(user_row_id)
            .bind(track_row_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn liked_years(&self, user_row_id: i64) -> Result<Vec<YearCount>> {
        let years = query_as::<_, YearCount>(
            r#"
            SELECT year, COUNT(*) AS count
            FROM liked_tracks
            WHERE user_id = ?
            GROUP BY year
            ORDER BY year DESC
            "#,
        )
        .bind(user_row_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(years)
    }

    async fn liked_months(&self, user_row_id: i64, year: Option<i32>) -> Result<Vec<MonthCount>> {
        let months = match year {
            Some(year) => {
                query_as::<_, MonthCount>(
                    r#"
                    SELECT year, month, COUNT(*) AS count
                    FROM liked_tracks
                    WHERE user_id = ? AND year = ?
                    GROUP BY year, month
                    ORDER BY year DESC, month DESC
                    "#,
                )
                .bind(user_row_id)
                .bind(year)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                query_as::<_, MonthCount>(
                    r#"
                    SELECT year, month, COUNT(*) AS count
                    FROM liked_tracks
                    WHERE user_id = ?
                    GROUP BY year, month
                    ORDER BY year DESC, month DESC
                    "#,
                )
                .bind(user_row_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::artist::{ArtistRepository, SqliteArtistRepository};
    use crate::repositories::track::{SqliteTrackRepository, TrackRepository};
    use crate::repositories::user::{NewCredentials, SqliteUserRepository, UserRepository};

    // 2023-06-15T00:00:00Z
    const BASE: i64 = 1_686_787_200;

    async fn seed_user(pool: &SqlitePool, user_id: &str) -> i64 {
        let users = SqliteUserRepository::new(pool.clone());
        users
            .upsert_credentials(&NewCredentials {
                user_id: user_id.to_string(),
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
                expires_at: BASE + 3600,
                api_token: "t".to_string(),
                now: BASE,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_track(pool: &SqlitePool, track_id: &str) -> i64 {
        let artists = SqliteArtistRepository::new(pool.clone());
        artists.insert_or_ignore("artist-1", "Caribou").await.unwrap();
        let artist_id = artists.id_for("artist-1").await.unwrap().unwrap();

        let tracks = SqliteTrackRepository::new(pool.clone());
        tracks
            .insert_or_ignore(track_id, &format!("Track {track_id}"), artist_id)
            .await
            .unwrap();
        tracks.id_for(track_id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_insert_derives_year_and_month() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let track = seed_track(&pool, "track-1").await;
        let repo = SqliteLikedTrackRepository::new(pool);

        repo.insert(user, track, BASE).await.unwrap();

        let rows = repo.rows_for_track(user, track).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2023);
        assert_eq!(rows[0].month, 6);
        assert_eq!(rows[0].added_at, BASE);
    }

    #[tokio::test]
    async fn test_insert_rejects_out_of_range_timestamp() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let track = seed_track(&pool, "track-1").await;
        let repo = SqliteLikedTrackRepository::new(pool);

        let result = repo.insert(user, track, i64::MAX).await;
        assert!(matches!(result, Err(StoreError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_page_in_remote_order() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let repo = SqliteLikedTrackRepository::new(pool.clone());

        // Liked in chronological order: track-1 oldest, track-3 newest
        for (i, id) in ["track-1", "track-2", "track-3"].iter().enumerate() {
            let track = seed_track(&pool, id).await;
            repo.insert(user, track, BASE + i as i64 * 60).await.unwrap();
        }

        let page = repo.page_in_remote_order(user, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].track_id, "track-3");
        assert_eq!(page[1].track_id, "track-2");

        let rest = repo.page_in_remote_order(user, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].track_id, "track-1");
    }

    #[tokio::test]
    async fn test_duplicate_detection_and_rows_order() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let track = seed_track(&pool, "track-1").await;
        let other = seed_track(&pool, "track-2").await;
        let repo = SqliteLikedTrackRepository::new(pool);

        repo.insert(user, track, BASE + 100).await.unwrap();
        repo.insert(user, track, BASE).await.unwrap();
        repo.insert(user, other, BASE + 50).await.unwrap();

        let dupes = repo.duplicate_track_ids(user).await.unwrap();
        assert_eq!(dupes, vec![track]);

        // Earliest added first, so the keeper is rows[0]
        let rows = repo.rows_for_track(user, track).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].added_at, BASE);
        assert_eq!(rows[1].added_at, BASE + 100);
    }

    #[tokio::test]
    async fn test_delete_rows_and_counts() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let track = seed_track(&pool, "track-1").await;
        let repo = SqliteLikedTrackRepository::new(pool);

        repo.insert(user, track, BASE).await.unwrap();
        repo.insert(user, track, BASE + 10).await.unwrap();
        assert_eq!(repo.count_for_user(user).await.unwrap(), 2);

        let rows = repo.rows_for_track(user, track).await.unwrap();
        let deleted = repo.delete_rows(&[rows[1].id]).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.count_for_user(user).await.unwrap(), 1);

        assert_eq!(repo.delete_rows(&[]).await.unwrap(), 0);

        let deleted = repo.delete_for_track(user, track).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.count_for_user(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remote_ids_are_distinct() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let track = seed_track(&pool, "track-1").await;
        let repo = SqliteLikedTrackRepository::new(pool);

        repo.insert(user, track, BASE).await.unwrap();
        repo.insert(user, track, BASE + 10).await.unwrap();

        let ids = repo.remote_ids_for_user(user).await.unwrap();
        assert_eq!(ids, vec!["track-1"]);
    }

    #[tokio::test]
    async fn test_year_and_month_reports() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let repo = SqliteLikedTrackRepository::new(pool.clone());

        // Two likes in June 2023, one in January 2024
        let jan_2024 = 1_704_067_200;
        for (id, at) in [
            ("track-1", BASE),
            ("track-2", BASE + 60),
            ("track-3", jan_2024),
        ] {
            let track = seed_track(&pool, id).await;
            repo.insert(user, track, at).await.unwrap();
        }

        let years = repo.liked_years(user).await.unwrap();
        assert_eq!(
            years,
            vec![
                YearCount { year: 2024, count: 1 },
                YearCount { year: 2023, count: 2 },
            ]
        );

        let months = repo.liked_months(user, Some(2023)).await.unwrap();
        assert_eq!(
            months,
            vec![MonthCount { year: 2023, month: 6, count: 2 }]
        );

        let all = repo.liked_months(user, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].year, 2024);
    }

    #[tokio::test]
    async fn test_remote_ids_for_month_scoped_and_ordered() {
        let pool = create_test_pool().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let repo = SqliteLikedTrackRepository::new(pool.clone());

        // Two likes in June 2023 (inserted newest first), one in January 2024
        let jan_2024 = 1_704_067_200;
        for (id, at) in [
            ("track-2", BASE + 60),
            ("track-1", BASE),
            ("track-3", jan_2024),
        ] {
            let track = seed_track(&pool, id).await;
            repo.insert(user, track, at).await.unwrap();
        }

        let june = repo.remote_ids_for_month(user, 2023, 6).await.unwrap();
        assert_eq!(june, vec!["track-1", "track-2"]);

        let january = repo.remote_ids_for_month(user, 2024, 1).await.unwrap();
        assert_eq!(january, vec!["track-3"]);

        assert!(repo
            .remote_ids_for_month(user, 2024, 2)
            .await
            .unwrap()
            .is_empty());
    }
}
