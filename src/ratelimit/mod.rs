//! Rate limiting logic and state management.

mod bucket;
mod clock;
mod limiter;
mod rules;
mod store;
pub mod sweeper;

pub use bucket::Bucket;
pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{Decision, RateLimiter};
pub use rules::{LimitRule, LimitRules, TimeUnit};
pub use store::{BucketStore, MemoryStore};
