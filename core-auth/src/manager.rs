//! Token lifecycle management.
//!
//! Keeps per-user credential rows fresh and applies them to the remote
//! client before requests go out. Refreshes are driven by the stored
//! expiry instant; upstream `expires_in` hints are ignored in favour of a
//! fixed window so the expiry check stays deterministic.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use chrono::Utc;
use core_remote::MusicService;
use core_store::models::User;
use core_store::repositories::{NewCredentials, TokenUpdate, UserRepository};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Fixed access-token validity window in seconds.
const TOKEN_TTL_SECS: i64 = 3600;

/// Seam between the request executor and token management.
///
/// Implemented by [`TokenManager`]; the executor only needs these two
/// operations.
#[async_trait]
pub trait TokenLifecycle: Send + Sync {
    /// Make sure the client carries a non-expired credential pair for the
    /// user, refreshing it first if the stored one is stale.
    async fn ensure_fresh(&self, user_id: &str) -> Result<()>;

    /// Refresh the credential pair unconditionally.
    async fn force_refresh(&self, user_id: &str) -> Result<()>;
}

/// Derive the API secret for a credential pair.
///
/// Deterministic: SHA-256 hex of the user id concatenated with the access
/// token.
pub fn api_secret(user_id: &str, access_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(access_token.as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Manages credential rows and applies fresh pairs to the remote client.
pub struct TokenManager {
    users: Arc<dyn UserRepository>,
    service: Arc<dyn MusicService>,
}

impl TokenManager {
    pub fn new(users: Arc<dyn UserRepository>, service: Arc<dyn MusicService>) -> Self {
        Self { users, service }
    }

    /// Register a user from an authorization code.
    ///
    /// Exchanges the code, stores the credential row (replacing any
    /// previous registration) and returns the derived API secret.
    #[instrument(skip(self, code))]
    pub async fn register(&self, user_id: &str, code: &str) -> Result<String> {
        let pair = self
            .service
            .exchange_code(code)
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        let refresh_token = pair.refresh_token.ok_or_else(|| {
            AuthError::ExchangeFailed("token response missing refresh token".to_string())
        })?;

        let now = Utc::now().timestamp();
        let secret = api_secret(user_id, &pair.access_token);

        self.users
            .upsert_credentials(&NewCredentials {
                user_id: user_id.to_string(),
                access_token: pair.access_token.clone(),
                refresh_token: refresh_token.clone(),
                expires_at: now + TOKEN_TTL_SECS,
                api_token: secret.clone(),
                now,
            })
            .await?;

        self.service.set_tokens(&pair.access_token, &refresh_token).await;
        info!(user_id, "Registered user");

        Ok(secret)
    }

    async fn load_user(&self, user_id: &str) -> Result<User> {
        self.users
            .find_by_remote_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))
    }

    /// Exchange the stored refresh token, persist the new pair and apply it
    /// to the client. A response without a refresh token keeps the old one.
    async fn refresh(&self, user: &User) -> Result<()> {
        let pair = self
            .service
            .refresh_access_token(&user.refresh_token)
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        let refresh_token = pair
            .refresh_token
            .unwrap_or_else(|| user.refresh_token.clone());
        let now = Utc::now().timestamp();

        self.users
            .update_tokens(
                &user.user_id,
                &TokenUpdate {
                    access_token: pair.access_token.clone(),
                    refresh_token: refresh_token.clone(),
                    expires_at: now + TOKEN_TTL_SECS,
                    api_token: api_secret(&user.user_id, &pair.access_token),
                    updated_at: now,
                },
            )
            .await?;

        self.service.set_tokens(&pair.access_token, &refresh_token).await;
        debug!(user_id = %user.user_id, "Refreshed access token");

        Ok(())
    }
}

#[async_trait]
impl TokenLifecycle for TokenManager {
    #[instrument(skip(self))]
    async fn ensure_fresh(&self, user_id: &str) -> Result<()> {
        let user = self.load_user(user_id).await?;

        if user.is_expired(Utc::now().timestamp()) {
            debug!(user_id, "Stored access token is stale");
            self.refresh(&user).await
        } else {
            self.service
                .set_tokens(&user.access_token, &user.refresh_token)
                .await;
            Ok(())
        }
    }

    #[instrument(skip(self))]
    async fn force_refresh(&self, user_id: &str) -> Result<()> {
        let user = self.load_user(user_id).await?;
        self.refresh(&user).await
    }
}
