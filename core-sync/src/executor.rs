//! Rate-limit-aware request executor.
//!
//! Every remote call made during a sync run goes through
//! [`RequestExecutor::execute`], which guarantees two properties:
//!
//! - the client carries fresh credentials before each attempt, and
//! - a 429 response never surfaces; the caller waits out the shared
//!   cool-down and retries.
//!
//! Any other failure gets exactly one forced token refresh and one more
//! attempt before it propagates. The retry is an explicit bounded loop, so
//! the worst case is easy to read off: unbounded only while the remote
//! keeps answering 429.

use crate::error::{Result, SyncError};
use crate::rate_limit::RateLimitGate;
use core_auth::TokenLifecycle;
use core_remote::RemoteError;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RequestExecutor {
    tokens: Arc<dyn TokenLifecycle>,
    gate: Arc<RateLimitGate>,
}

impl RequestExecutor {
    pub fn new(tokens: Arc<dyn TokenLifecycle>, gate: Arc<RateLimitGate>) -> Self {
        Self { tokens, gate }
    }

    /// Run a remote action to completion on behalf of a user.
    ///
    /// `action` must be re-invocable: it is called again after a cool-down
    /// or a forced refresh.
    pub async fn execute<T, F, Fut>(&self, user_id: &str, action: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = core_remote::Result<T>> + Send,
    {
        let mut refreshed = false;

        loop {
            self.tokens.ensure_fresh(user_id).await?;

            match action().await {
                Ok(value) => return Ok(value),
                Err(RemoteError::RateLimited) => {
                    debug!(user_id, "Rate limited, awaiting shared cool-down");
                    self.gate.pause().await;
                }
                Err(error) if !refreshed => {
                    warn!(user_id, error = %error, "Remote call failed, forcing token refresh");
                    refreshed = true;
                    self.tokens.force_refresh(user_id).await?;
                }
                Err(error) => return Err(SyncError::RemoteCallFailed(error)),
            }
        }
    }
}
