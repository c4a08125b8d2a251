//! Request pacing: a minimum interval between consecutive requests.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::warn;

/// Interval used when the configured one cannot be represented
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Spaces requests at least `interval` apart
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimiterState>>,
}

struct RateLimiterState {
    next_slot: Option<Instant>,
    interval: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing one request per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimiterState {
                next_slot: None,
                interval,
            })),
        }
    }

    /// Create from a (possibly fractional) number of seconds.
    /// Negative or NaN means no pacing; a value too large for a
    /// `Duration` falls back to [`DEFAULT_INTERVAL`].
    pub fn from_secs(secs: f64) -> Self {
        let interval = Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or_else(|_| {
            warn!(secs, "request interval out of range, using default");
            DEFAULT_INTERVAL
        });
        Self::new(interval)
    }

    /// Wait until the next request slot
    pub async fn acquire(&self) {
        let wait = {
            let mut state = self.state.lock().await;
            let now = Instant::now();

            let start = match state.next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            state.next_slot = Some(start + state.interval);
            start - now
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
