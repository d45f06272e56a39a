//! # Library Synchronization
//!
//! The request executor with its shared rate-limit cool-down, the entity
//! upsert layer, the reconciliation engine that keeps a user's local
//! mirror converged with their remote liked-tracks library, and the
//! builder that assembles one remote playlist per month of likes.

pub mod error;
pub mod executor;
pub mod playlists;
pub mod progress;
pub mod rate_limit;
pub mod reconciler;
pub mod upsert;

pub use error::{Result, SyncError};
pub use executor::RequestExecutor;
pub use playlists::{month_playlist_name, PlaylistBuilder};
pub use progress::{ProgressSink, Severity, TracingProgress};
pub use rate_limit::RateLimitGate;
pub use reconciler::{ReconcileEngine, PAGE_SIZE};
pub use upsert::LikedTrackWriter;
