use core_auth::AuthError;
use core_remote::RemoteError;
use core_store::StoreError;
use thiserror::Error;

/// Errors surfaced to reconciliation callers.
///
/// `RemoteError::RateLimited` never appears here: the executor absorbs it
/// behind the shared cool-down.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Token exchange failed: {0}")]
    AuthExchangeFailed(String),

    #[error("Remote call failed: {0}")]
    RemoteCallFailed(RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for SyncError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UserNotFound(id) => Self::UserNotFound(id),
            AuthError::ExchangeFailed(message) => Self::AuthExchangeFailed(message),
            AuthError::Store(e) => Self::Store(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_mapping() {
        let error: SyncError = AuthError::UserNotFound("alice".to_string()).into();
        assert!(matches!(error, SyncError::UserNotFound(_)));

        let error: SyncError = AuthError::ExchangeFailed("invalid_grant".to_string()).into();
        assert!(matches!(error, SyncError::AuthExchangeFailed(_)));
    }
}
