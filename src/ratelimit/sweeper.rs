//! Background eviction of stale buckets.
//!
//! The key-to-bucket map grows as new keys are seen. The sweeper runs on a
//! fixed cadence and drops buckets that have sat idle past their staleness
//! horizon, bounding memory for long-lived processes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::clock::Clock;
use super::limiter::RateLimiter;
use super::store::BucketStore;

/// Spawn a sweep task that runs every `every` until aborted.
pub fn spawn<S, C>(limiter: Arc<RateLimiter<S, C>>, every: Duration) -> JoinHandle<()>
where
    S: BucketStore + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            run_once(&limiter);
        }
    })
}

/// Spawn a sweep task that runs every `every` until the provided signal
/// resolves.
pub fn spawn_with_shutdown<S, C, F>(
    limiter: Arc<RateLimiter<S, C>>,
    every: Duration,
    signal: F,
) -> JoinHandle<()>
where
    S: BucketStore + 'static,
    C: Clock + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;

        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    run_once(&limiter);
                }
                _ = &mut signal => {
                    info!("Sweeper received shutdown signal");
                    break;
                }
            }
        }
    })
}

fn run_once<S: BucketStore, C: Clock>(limiter: &RateLimiter<S, C>) {
    let removed = limiter.evict_expired();
    if removed > 0 {
        debug!(removed = removed, "Swept expired rate limit buckets");
    }
}
