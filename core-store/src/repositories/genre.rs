//! Genre repository trait and implementation

use crate::error::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Genre repository interface
#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// Insert a genre label if it does not exist yet
    async fn insert_or_ignore(&self, name: &str) -> Result<()>;

    /// Row id for a genre label, if present
    async fn id_for(&self, name: &str) -> Result<Option<i64>>;

    /// Associate a genre with an artist; idempotent per pair
    async fn link_artist(&self, artist_row_id: i64, genre_row_id: i64) -> Result<()>;

    /// Genre labels associated with an artist
    async fn genres_for_artist(&self, artist_row_id: i64) -> Result<Vec<String>>;
}

/// SQLite implementation of GenreRepository
pub struct SqliteGenreRepository {
    pool: SqlitePool,
}

impl SqliteGenreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenreRepository for SqliteGenreRepository {
    async fn insert_or_ignore(&self, name: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO genres (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn id_for(&self, name: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM genres WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn link_artist(&self, artist_row_id: i64, genre_row_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO artist_genres (artist_id, genre_id) VALUES (?, ?)")
            .bind(artist_row_id)
            .bind(genre_row_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn genres_for_artist(&self, artist_row_id: i64) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT g.name
            FROM artist_genres ag
            JOIN genres g ON g.id = ag.genre_id
            WHERE ag.artist_id = ?
            ORDER BY g.name
            "#,
        )
        .bind(artist_row_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}
