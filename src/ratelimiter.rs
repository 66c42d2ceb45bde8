//! Local sliding window rate limiting.
//!
//! Every client keeps the instants of its admitted requests. A new request is
//! admitted when fewer than `limit` of them are younger than the window, and
//! only admitted requests are recorded.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Source of monotonic time for the limiter.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Clock using the OS monotonic time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Error raised while building a [`RateLimiter`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LimiterError {
    #[error("invalid rate limiter configuration: {0}")]
    InvalidConfiguration(&'static str),
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// `retry_after` is the time left before the oldest recorded request
    /// leaves the window.
    Rejected { retry_after: Duration },
}

impl Decision {
    /// Whether the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

struct Inner {
    limit: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

/// Per-client sliding window rate limiter.
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Example
/// ```rust
/// use induk::ratelimiter::RateLimiter;
/// use std::time::Duration;
///
/// let limiter = RateLimiter::new(100, Duration::from_secs(60)).unwrap();
/// assert!(limiter.allow("203.0.113.7"));
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.inner.limit)
            .field("window", &self.inner.window)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a new [`RateLimiter`] admitting `limit` requests per `window`
    /// for each client.
    pub fn new(limit: usize, window: Duration) -> Result<Self, LimiterError> {
        Self::with_clock(limit, window, Arc::new(SystemClock))
    }

    /// Create a new [`RateLimiter`] reading time from `clock`.
    pub fn with_clock(
        limit: usize,
        window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LimiterError> {
        if limit == 0 {
            return Err(LimiterError::InvalidConfiguration(
                "limit must allow at least one request",
            ));
        }

        if window.is_zero() {
            return Err(LimiterError::InvalidConfiguration(
                "window duration must be greater than zero",
            ));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                limit,
                window,
                clock,
                windows: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Maximum admitted requests per window.
    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Length of the sliding window.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    // A panic while holding the lock leaves at worst a half-pruned list,
    // which is still a valid window.
    fn windows(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.inner
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks if a new request from `client_id` is admitted. If so, it is
    /// recorded.
    pub fn allow(&self, client_id: &str) -> bool {
        self.check(client_id).is_allowed()
    }

    /// Same as [`RateLimiter::allow`], but a rejection tells when the client
    /// may retry.
    pub fn check(&self, client_id: &str) -> Decision {
        let window = self.inner.window;
        let mut windows = self.windows();
        // Read time under the lock so each list stays sorted.
        let now = self.inner.clock.now();
        let timestamps = windows.entry(client_id.to_owned()).or_default();

        prune(timestamps, now, window);

        if timestamps.len() >= self.inner.limit {
            let retry_after = timestamps
                .front()
                .map(|oldest| {
                    window.saturating_sub(now.saturating_duration_since(*oldest))
                })
                .unwrap_or(window);

            return Decision::Rejected { retry_after };
        }

        timestamps.push_back(now);
        Decision::Allowed
    }

    /// Prune every client and forget those without any recent request.
    ///
    /// Returns how many clients were evicted.
    pub fn sweep(&self) -> usize {
        let window = self.inner.window;
        let mut windows = self.windows();
        let now = self.inner.clock.now();
        let before = windows.len();

        windows.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });

        before - windows.len()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows().len()
    }

    /// Start the background sweep on the tokio runtime.
    ///
    /// The task runs every `period` until `shutdown` holds `true` or its
    /// sender is dropped. A zero `period` falls back to the window length.
    pub fn spawn_sweeper(
        &self,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let limiter = self.clone();
        let period = if period.is_zero() {
            self.inner.window
        } else {
            period
        };

        tokio::spawn(async move {
            if *shutdown.borrow() {
                return;
            }

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let evicted = limiter.sweep();
                        let tracked = limiter.tracked_clients();

                        metrics::gauge!(crate::telemetry::TRACKED_CLIENTS).set(tracked as f64);
                        tracing::debug!(evicted, tracked, "rate limiter sweep done");
                    },
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    },
                }
            }

            tracing::debug!("rate limiter sweeper stopped");
        })
    }
}

/// Drop instants which are not strictly younger than `window`.
fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Clock moved by hand.
#[cfg(test)]
pub(crate) struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Jump to `secs` seconds after creation.
    pub(crate) fn set(&self, secs: u64) {
        *self.offset.lock().unwrap() = Duration::from_secs(secs);
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }
}
