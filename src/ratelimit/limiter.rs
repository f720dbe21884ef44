//! Core rate limiter implementation.

use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{FloodgateError, Result};

use super::clock::{Clock, SystemClock};
use super::rules::LimitRules;
use super::store::{BucketStore, MemoryStore};

/// Default rate limit when no rule matches a key.
const DEFAULT_LIMIT: u64 = 1000;
/// Default time window when no rule matches a key.
const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// The outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Advisory wait before retrying, present only when denied. This is a
    /// lower bound: the window reset is not sliding.
    pub retry_after: Option<Duration>,
    /// The limit that was applied
    pub limit: u64,
    /// Requests left in the current window
    pub remaining: u64,
}

impl Decision {
    /// Create an admitted decision.
    pub fn allowed(limit: u64, remaining: u64) -> Self {
        Self {
            allowed: true,
            retry_after: None,
            limit,
            remaining,
        }
    }

    /// Create a denied decision.
    pub fn denied(limit: u64, retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after: Some(retry_after),
            limit,
            remaining: 0,
        }
    }
}

/// The core rate limiter that manages per-key buckets.
///
/// This struct is thread-safe and can be shared across multiple tasks. Each
/// check-and-increment runs with exclusive access to its bucket, so two
/// concurrent callers for one key can never both take the last slot.
pub struct RateLimiter<S: BucketStore = MemoryStore, C: Clock = SystemClock> {
    /// Bucket storage, injected so deployments control growth
    store: S,
    /// Time source
    clock: C,
    /// Declarative rules consulted by [`RateLimiter::check`]
    rules: RwLock<LimitRules>,
}

impl RateLimiter {
    /// Create a rate limiter with an in-memory store and the system clock.
    pub fn new() -> Self {
        Self::with_parts(MemoryStore::new(), SystemClock)
    }

    /// Create a rate limiter from library configuration.
    pub fn with_config(config: &crate::config::FloodgateConfig) -> Self {
        Self {
            store: MemoryStore::with_settings(config.store.clone()),
            clock: SystemClock,
            rules: RwLock::new(config.rules.clone()),
        }
    }
}

impl<S: BucketStore, C: Clock> RateLimiter<S, C> {
    /// Create a rate limiter from its parts.
    pub fn with_parts(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            rules: RwLock::new(LimitRules::new()),
        }
    }

    /// Replace the declarative rules.
    pub fn set_rules(&self, rules: LimitRules) {
        let mut current = self.rules.write();
        *current = rules;
    }

    /// Get a copy of the current rules.
    pub fn rules(&self) -> LimitRules {
        self.rules.read().clone()
    }

    /// Decide whether the request identified by `key` may proceed, under a
    /// budget of `limit` requests per `window`.
    ///
    /// The counting window is fixed, not sliding: once `window` has elapsed
    /// since the bucket's window started, the count hard-resets. A `limit`
    /// of zero always denies. An empty `key` or zero `window` is a caller
    /// configuration error and is rejected immediately.
    pub fn check_and_consume(&self, key: &str, limit: u64, window: Duration) -> Result<Decision> {
        if key.is_empty() {
            return Err(FloodgateError::EmptyKey);
        }
        if window.is_zero() {
            return Err(FloodgateError::ZeroWindow);
        }

        let now = self.clock.now();

        trace!(
            key = %key,
            limit = limit,
            window_ms = window.as_millis() as u64,
            "Checking rate limit"
        );

        let decision = self.store.update(key, now, |bucket| {
            if bucket.expired(now, window) {
                bucket.reset(now);
            }
            bucket.window = window;

            if bucket.count >= limit {
                Decision::denied(limit, bucket.retry_after(now, window))
            } else {
                bucket.count += 1;
                Decision::allowed(limit, limit - bucket.count)
            }
        });

        if !decision.allowed {
            debug!(
                key = %key,
                limit = limit,
                "Rate limit exceeded"
            );
        }

        Ok(decision)
    }

    /// Decide whether the request identified by `key` may proceed, with the
    /// budget resolved from the held rules (falling back to the built-in
    /// default of 1000 requests per second).
    pub fn check(&self, key: &str) -> Result<Decision> {
        let (limit, window) = {
            let rules = self.rules.read();
            match rules.find_limit(key) {
                Some(rule) => (rule.requests_per_unit, rule.window()),
                None => (DEFAULT_LIMIT, DEFAULT_WINDOW),
            }
        };

        self.check_and_consume(key, limit, window)
    }

    /// Get the stored count for a key, or `None` if no bucket exists.
    ///
    /// This is a pure read: the value is stable between consuming calls and
    /// is not adjusted for window expiry.
    pub fn current_count(&self, key: &str) -> Option<u64> {
        self.store.get(key).map(|bucket| bucket.count)
    }

    /// Get the number of live buckets.
    pub fn bucket_count(&self) -> usize {
        self.store.len()
    }

    /// Drop buckets that have sat idle past their staleness horizon.
    /// Returns the number of buckets removed.
    pub fn evict_expired(&self) -> usize {
        self.store.evict_expired(self.clock.now())
    }

    /// Clear all buckets.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.store.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
