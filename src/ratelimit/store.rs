//! Bucket storage.
//!
//! The mapping from key to bucket is an explicit dependency of the limiter
//! rather than implicit process-wide state, so deployments can bound its
//! size or swap in their own storage.

use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::StoreSettings;

use super::bucket::Bucket;

/// Storage for per-key rate limit buckets.
///
/// Implementations must support safe concurrent insertion of new keys, and
/// `update` must give the closure exclusive access to the bucket so that a
/// check-and-increment sequence is atomic per key.
pub trait BucketStore: Send + Sync {
    /// Run `f` with exclusive access to the bucket for `key`, creating an
    /// empty bucket whose window starts at `now` if the key is unseen.
    fn update<T>(&self, key: &str, now: Instant, f: impl FnOnce(&mut Bucket) -> T) -> T;

    /// Snapshot of the bucket for `key`, if one exists. Pure read.
    fn get(&self, key: &str) -> Option<Bucket>;

    /// Number of live buckets.
    fn len(&self) -> usize;

    /// Whether the store holds no buckets.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop buckets that have sat idle past their staleness horizon.
    /// Returns the number of buckets removed.
    fn evict_expired(&self, now: Instant) -> usize;

    /// Remove all buckets.
    fn clear(&self);
}

/// In-memory bucket store backed by a concurrent hash map.
///
/// `max_buckets` is a sweep trigger rather than a hard cap: when the store
/// is full and a new key arrives, stale buckets are evicted inline before
/// the insert, but the insert itself always succeeds.
pub struct MemoryStore {
    /// Buckets indexed by key
    buckets: DashMap<String, Bucket>,
    /// Capacity and staleness settings
    settings: StoreSettings,
}

impl MemoryStore {
    /// Create a store with default settings.
    pub fn new() -> Self {
        Self::with_settings(StoreSettings::default())
    }

    /// Create a store with the given settings.
    pub fn with_settings(settings: StoreSettings) -> Self {
        Self {
            buckets: DashMap::new(),
            settings,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketStore for MemoryStore {
    fn update<T>(&self, key: &str, now: Instant, f: impl FnOnce(&mut Bucket) -> T) -> T {
        if !self.buckets.contains_key(key) && self.buckets.len() >= self.settings.max_buckets {
            let removed = self.evict_expired(now);
            if removed == 0 {
                warn!(
                    buckets = self.buckets.len(),
                    max_buckets = self.settings.max_buckets,
                    "Bucket store is over capacity and nothing was evictable"
                );
            }
        }

        let mut entry = self.buckets.entry(key.to_string()).or_insert_with(|| {
            debug!(key = %key, "Creating new rate limit bucket");
            Bucket::new(now)
        });
        f(entry.value_mut())
    }

    fn get(&self, key: &str) -> Option<Bucket> {
        self.buckets.get(key).map(|entry| *entry.value())
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }

    fn evict_expired(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        let stale_after = self.settings.stale_after_windows;
        self.buckets.retain(|_, bucket| !bucket.stale(now, stale_after));
        before.saturating_sub(self.buckets.len())
    }

    fn clear(&self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_update_creates_bucket_lazily() {
        let store = MemoryStore::new();
        let now = Instant::now();

        assert!(store.is_empty());

        let count = store.update("ip:1.2.3.4", now, |bucket| {
            bucket.count += 1;
            bucket.count
        });

        assert_eq!(count, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_reuses_existing_bucket() {
        let store = MemoryStore::new();
        let now = Instant::now();

        store.update("key", now, |bucket| bucket.count += 1);
        store.update("key", now, |bucket| bucket.count += 1);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("key").unwrap().count, 2);
    }

    #[test]
    fn test_get_is_a_pure_snapshot() {
        let store = MemoryStore::new();
        let now = Instant::now();

        assert!(store.get("missing").is_none());

        store.update("key", now, |bucket| bucket.count = 3);

        // Repeated reads observe the same state.
        assert_eq!(store.get("key").unwrap().count, 3);
        assert_eq!(store.get("key").unwrap().count, 3);
    }

    #[test]
    fn test_evict_expired_drops_stale_buckets() {
        let store = MemoryStore::with_settings(StoreSettings {
            max_buckets: 100,
            stale_after_windows: 2,
        });
        let start = Instant::now();
        let window = Duration::from_secs(1);

        store.update("old", start, |bucket| {
            bucket.count = 1;
            bucket.window = window;
        });

        let later = start + Duration::from_secs(5);
        store.update("fresh", later, |bucket| {
            bucket.count = 1;
            bucket.window = window;
        });

        let removed = store.evict_expired(later);
        assert_eq!(removed, 1);
        assert!(store.get("old").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_full_store_evicts_inline_and_still_inserts() {
        let store = MemoryStore::with_settings(StoreSettings {
            max_buckets: 1,
            stale_after_windows: 1,
        });
        let start = Instant::now();
        let window = Duration::from_secs(1);

        store.update("first", start, |bucket| {
            bucket.count = 1;
            bucket.window = window;
        });

        // "first" is stale by now, so the capacity trigger clears it.
        let later = start + Duration::from_secs(10);
        store.update("second", later, |bucket| {
            bucket.count = 1;
            bucket.window = window;
        });

        assert!(store.get("first").is_none());
        assert!(store.get("second").is_some());
    }

    #[test]
    fn test_insert_succeeds_even_when_nothing_evictable() {
        let store = MemoryStore::with_settings(StoreSettings {
            max_buckets: 1,
            stale_after_windows: 4,
        });
        let now = Instant::now();
        let window = Duration::from_secs(60);

        store.update("first", now, |bucket| {
            bucket.count = 1;
            bucket.window = window;
        });
        store.update("second", now, |bucket| {
            bucket.count = 1;
            bucket.window = window;
        });

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        let now = Instant::now();

        store.update("a", now, |_| {});
        store.update("b", now, |_| {});
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}
