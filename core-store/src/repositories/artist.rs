//! Artist repository trait and implementation

use crate::error::Result;
use crate::models::Artist;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Artist repository interface
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Insert an artist if no row with the same remote id exists.
    ///
    /// Idempotent: a second call with the same `artist_id` is a no-op,
    /// atomic against a concurrent identical insert.
    async fn insert_or_ignore(&self, artist_id: &str, name: &str) -> Result<()>;

    /// Row id for a remote artist id, if present
    async fn id_for(&self, artist_id: &str) -> Result<Option<i64>>;

    /// Find an artist by its remote id
    async fn find_by_remote_id(&self, artist_id: &str) -> Result<Option<Artist>>;
}

/// SQLite implementation of ArtistRepository
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn insert_or_ignore(&self, artist_id: &str, name: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO artists (artist_id, name) VALUES (?, ?)")
            .bind(artist_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn id_for(&self, artist_id: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM artists WHERE artist_id = ?")
            .bind(artist_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find_by_remote_id(&self, artist_id: &str) -> Result<Option<Artist>> {
        let artist = query_as::<_, Artist>("SELECT * FROM artists WHERE artist_id = ?")
            .bind(artist_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_insert_or_ignore_is_idempotent() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteArtistRepository::new(pool);

        repo.insert_or_ignore("artist-1", "Boards of Canada")
            .await
            .unwrap();
        let first = repo.id_for("artist-1").await.unwrap().unwrap();

        // Second insert with a different name must not replace the row
        repo.insert_or_ignore("artist-1", "Renamed").await.unwrap();
        let second = repo.id_for("artist-1").await.unwrap().unwrap();

        assert_eq!(first, second);
        let artist = repo.find_by_remote_id("artist-1").await.unwrap().unwrap();
        assert_eq!(artist.name, "Boards of Canada");
    }

    #[tokio::test]
    async fn test_id_for_unknown_artist() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteArtistRepository::new(pool);

        assert!(repo.id_for("missing").await.unwrap().is_none());
    }
}
