//! Error types for the remote music service boundary

use thiserror::Error;

/// Remote service errors.
///
/// Status inspection happens only inside the client; callers match on the
/// variant, never on status numbers.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The service responded 429; the caller should back off and retry
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Non-success API response other than a rate limit
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RemoteError::Api {
            status: 403,
            message: "Insufficient client scope".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "API error (status 403): Insufficient client scope"
        );
    }
}
