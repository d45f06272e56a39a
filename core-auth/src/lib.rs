//! # Token Lifecycle
//!
//! Registration and refresh of per-user OAuth credential pairs, plus the
//! [`TokenLifecycle`] seam the request executor drives.

pub mod error;
pub mod manager;

pub use error::{AuthError, Result};
pub use manager::{api_secret, TokenLifecycle, TokenManager};
