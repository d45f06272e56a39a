//! Progress reporting for long-running reconciliation runs.

use tracing::{info, warn};

/// Weight of a progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

/// Receives human-readable progress messages at phase boundaries and
/// per-page milestones.
///
/// Implemented for any `Fn(&str, Severity)` closure, so tests can collect
/// messages into a vector.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str, severity: Severity);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, Severity) + Send + Sync,
{
    fn report(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}

/// Sink that forwards progress into the tracing stream.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warn => warn!("{message}"),
        }
    }
}
