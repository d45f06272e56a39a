//! User repository trait and implementation

use crate::error::{Result, StoreError};
use crate::models::User;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Credential set written on first registration (or re-registration).
#[derive(Debug, Clone)]
pub struct NewCredentials {
    /// Remote account identifier
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix second at which the access token expires
    pub expires_at: i64,
    /// Derived API secret
    pub api_token: String,
    /// Unix second of the write, used for created_at/updated_at
    pub now: i64,
}

/// Token state written after a refresh.
#[derive(Debug, Clone)]
pub struct TokenUpdate {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub api_token: String,
    pub updated_at: i64,
}

/// User repository interface for credential storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their remote account identifier
    ///
    /// # Returns
    /// - `Ok(Some(user))` if found
    /// - `Ok(None)` if not found
    async fn find_by_remote_id(&self, user_id: &str) -> Result<Option<User>>;

    /// Insert a credential row, or replace the token state if the user
    /// already exists. Returns the stored row.
    async fn upsert_credentials(&self, credentials: &NewCredentials) -> Result<User>;

    /// Replace the token state of an existing user
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if no row matches `user_id`.
    async fn update_tokens(&self, user_id: &str, update: &TokenUpdate) -> Result<()>;

    /// Delete a user and their liked rows
    ///
    /// # Returns
    /// - `Ok(true)` if the user was deleted
    /// - `Ok(false)` if the user was not found
    async fn delete(&self, user_id: &str) -> Result<bool>;
}

/// SQLite implementation of UserRepository
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_remote_id(&self, user_id: &str) -> Result<Option<User>> {
        let user = query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn upsert_credentials(&self, credentials: &NewCredentials) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, access_token, refresh_token, expires_at,
                api_token, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                api_token = excluded.api_token,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&credentials.user_id)
        .bind(&credentials.access_token)
        .bind(&credentials.refresh_token)
        .bind(credentials.expires_at)
        .bind(&credentials.api_token)
        .bind(credentials.now)
        .bind(credentials.now)
        .execute(&self.pool)
        .await?;

        let user = query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(&credentials.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_tokens(&self, user_id: &str, update: &TokenUpdate) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                access_token = ?, refresh_token = ?, expires_at = ?,
                api_token = ?, updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(&update.access_token)
        .bind(&update.refresh_token)
        .bind(update.expires_at)
        .bind(&update.api_token)
        .bind(update.updated_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "User",
                id: user_id.to_string(),
            });
        }

        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<bool> {
        sqlx::query(
            "DELETE FROM liked_tracks WHERE user_id IN (SELECT id FROM users WHERE user_id = ?)",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
