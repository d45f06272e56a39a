//! Process-wide rate-limit cool-down.
//!
//! One gate instance is shared by every executor in the process. When the
//! remote service answers 429, all callers funnel through
//! [`RateLimitGate::pause`]: the first one through the timer mutex sleeps
//! out the cool-down
//! and clears the flag, callers queued behind it observe the cleared flag
//! and return without sleeping again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

/// Default cool-down after a 429 response.
const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(1);

/// Shared cool-down gate. At most one cool-down timer is active at a time.
pub struct RateLimitGate {
    limited: AtomicBool,
    timer: Mutex<()>,
    cool_down: Duration,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::with_cool_down(DEFAULT_COOL_DOWN)
    }

    pub fn with_cool_down(cool_down: Duration) -> Self {
        Self {
            limited: AtomicBool::new(false),
            timer: Mutex::new(()),
            cool_down,
        }
    }

    /// Record a rate-limit response and wait until the shared cool-down has
    /// elapsed.
    ///
    /// A caller arriving while a cool-down is already in flight awaits the
    /// same timer; a caller arriving after it completed starts a new one.
    pub async fn pause(&self) {
        self.limited.store(true, Ordering::SeqCst);

        let _guard = self.timer.lock().await;
        if self.limited.load(Ordering::SeqCst) {
            debug!(cool_down_ms = self.cool_down.as_millis() as u64, "Cooling down");
            sleep(self.cool_down).await;
            self.limited.store(false, Ordering::SeqCst);
        }
    }
}

impl Default for RateLimitGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_single_pause_waits_cool_down() {
        let gate = RateLimitGate::with_cool_down(Duration::from_secs(1));

        let start = Instant::now();
        gate.pause().await;

        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_pauses_share_one_timer() {
        let gate = Arc::new(RateLimitGate::with_cool_down(Duration::from_secs(1)));

        let start = Instant::now();
        let first = tokio::spawn({
            let gate = gate.clone();
            async move { gate.pause().await }
        });
        let second = tokio::spawn({
            let gate = gate.clone();
            async move { gate.pause().await }
        });

        first.await.unwrap();
        second.await.unwrap();

        // Both callers ride the same cool-down instead of stacking two
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_after_completion_starts_new_timer() {
        let gate = RateLimitGate::with_cool_down(Duration::from_secs(1));

        let start = Instant::now();
        gate.pause().await;
        gate.pause().await;

        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
