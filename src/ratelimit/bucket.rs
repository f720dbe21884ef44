//! Per-key bucket state.

use std::time::{Duration, Instant};

/// Per-key rate limiting state: the number of requests admitted in the
/// current window and when that window started.
///
/// A bucket is created lazily on first request for a previously-unseen key.
/// It has two logical states, active (`count < limit`) and throttled
/// (`count >= limit`), with transitions driven only by elapsed time (hard
/// reset to an empty window) or consumption.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    /// Requests admitted in the current window
    pub count: u64,
    /// When the current window started
    pub window_start: Instant,
    /// The window duration last applied to this bucket, used to judge
    /// staleness during eviction
    pub window: Duration,
}

impl Bucket {
    /// Create an empty bucket whose window starts at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            window: Duration::ZERO,
        }
    }

    /// Whether the window that began at `window_start` has ended at `now`.
    pub fn expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_start) > window
    }

    /// Hard reset: a new window begins at `now` with nothing consumed.
    ///
    /// This is a fixed-window reset, not a sliding one. Bursts of up to
    /// twice the limit are possible across a window boundary, which is an
    /// accepted imprecision of the policy.
    pub fn reset(&mut self, now: Instant) {
        self.count = 0;
        self.window_start = now;
    }

    /// Time remaining until the current window ends, clamped to zero.
    pub fn retry_after(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.duration_since(self.window_start))
    }

    /// Whether this bucket has sat past `stale_after_windows` full windows
    /// and can be dropped by an eviction pass.
    pub fn stale(&self, now: Instant, stale_after_windows: u32) -> bool {
        // A bucket that has never been through a consuming call carries a
        // zero window and is immediately stale.
        let keep_for = self.window * stale_after_windows;
        now.duration_since(self.window_start) > keep_for
    }
}
