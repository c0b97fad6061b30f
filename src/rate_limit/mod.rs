//! Rate-limited access to the upstream API.
//!
//! - `RateLimiter` hands out dispatch slots so the wire never exceeds the
//!   configured requests-per-second, whatever the number of concurrent callers.
//! - `FetchQueue` layers status classification and bounded retries on top.

mod backend;
mod config;
mod limiter;
mod memory;
mod queue;

#[cfg(test)]
pub(crate) use queue::testing;

pub use backend::{RateLimitBackend, RateLimitError, RateLimitResult};
pub use config::{
    FetchStats, RateLimitConfig, RetryPolicy, DEFAULT_RATE_LIMIT_BACKOFF, DEFAULT_TARGET_RPS,
    MIN_TARGET_RPS,
};
pub use limiter::{BoxedRateLimitBackend, RateLimiter};
pub use memory::InMemoryRateLimitBackend;
pub use queue::{FetchError, FetchQueue, UPSTREAM_KEY};

use std::time::Duration;

use rand::Rng;

/// Uniformly random delay between `min` and `max` (inclusive).
pub fn jittered_delay(min: Duration, max: Duration) -> Duration {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let lo_ms = lo.as_millis() as u64;
    let hi_ms = hi.as_millis() as u64;
    if lo_ms == hi_ms {
        return lo;
    }
    Duration::from_millis(rand::rng().random_range(lo_ms..=hi_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_delay_handles_swapped_and_equal_bounds() {
        let delay = jittered_delay(Duration::from_millis(30), Duration::from_millis(10));
        assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(30));
        assert_eq!(
            jittered_delay(Duration::from_secs(1), Duration::from_secs(1)),
            Duration::from_secs(1)
        );
    }
}
