//! Track repository trait and implementation

use crate::error::Result;
use crate::models::Track;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Track repository interface
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Insert a track if no row with the same remote id exists.
    ///
    /// Idempotent per `track_id`; the stored name and artist are those of
    /// the first insert.
    async fn insert_or_ignore(&self, track_id: &str, name: &str, artist_row_id: i64)
        -> Result<()>;

    /// Row id for a remote track id, if present
    async fn id_for(&self, track_id: &str) -> Result<Option<i64>>;

    /// Find a track by its remote id
    async fn find_by_remote_id(&self, track_id: &str) -> Result<Option<Track>>;

    /// Delete a track row by row id
    ///
    /// # Returns
    /// - `Ok(true)` if the track was deleted
    /// - `Ok(false)` if the track was not found
    async fn delete_by_id(&self, id: i64) -> Result<bool>;
}

/// SQLite implementation of TrackRepository
pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn insert_or_ignore(
        &self,
        track_id: &str,
        name: &str,
        artist_row_id: i64,
    ) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO tracks (track_id, name, artist_id) VALUES (?, ?, ?)")
            .bind(track_id)
            .bind(name)
            .bind(artist_row_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn id_for(&self, track_id: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM tracks WHERE track_id = ?")
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find_by_remote_id(&self, track_id: &str) -> Result<Option<Track>> {
        let track = query_as::<_, Track>("SELECT * FROM tracks WHERE track_id = ?")
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(track)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
