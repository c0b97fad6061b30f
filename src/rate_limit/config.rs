//! Pacing and retry configuration.

use std::time::Duration;

/// Default global request ceiling.
pub const DEFAULT_TARGET_RPS: f64 = 5.0;

/// Slowest accepted pacing: one request every 1000 seconds.
pub const MIN_TARGET_RPS: f64 = 0.001;

/// Default backoff after an HTTP 429.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(30);

/// Configuration for global request pacing.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Requests per second allowed on the wire.
    pub target_rps: f64,
    /// Fixed sleep before redispatching a rate-limited request.
    pub rate_limit_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            target_rps: DEFAULT_TARGET_RPS,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }
}

impl RateLimitConfig {
    /// Minimum spacing between two dispatches (`1000ms / target_rps`).
    /// A non-positive target disables pacing; tiny targets are raised to
    /// `MIN_TARGET_RPS`.
    pub fn min_interval(&self) -> Duration {
        if self.target_rps > 0.0 && self.target_rps.is_finite() {
            Duration::from_secs_f64(1.0 / self.target_rps.max(MIN_TARGET_RPS))
        } else {
            Duration::ZERO
        }
    }

    /// Whether `rps` is a usable pacing target for configuration.
    pub fn is_valid_rps(rps: f64) -> bool {
        rps.is_finite() && rps >= MIN_TARGET_RPS
    }
}

/// Per-request retry budget for transient failures.
///
/// Only 5xx responses and transport errors count against `max_attempts`;
/// rate-limit responses are retried outside the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total budget-consuming attempts before giving up (at least 1).
    pub max_attempts: u32,
    /// Lower bound of the jittered delay between attempts.
    pub min_delay: Duration,
    /// Upper bound of the jittered delay between attempts.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_delay,
            max_delay,
        }
    }

    /// Budget for listing pages.
    pub fn listing() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(3))
    }

    /// Budget for product detail lookups.
    pub fn product() -> Self {
        Self::new(5, Duration::from_secs(1), Duration::from_secs(3))
    }

    /// Random delay in `[min_delay, max_delay]`.
    pub fn jittered_delay(&self) -> Duration {
        super::jittered_delay(self.min_delay, self.max_delay)
    }
}

/// Counters accumulated by a fetch queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub requests: u64,
    pub successes: u64,
    pub rate_limited: u64,
    pub transient_failures: u64,
    pub exhausted: u64,
    pub not_found: u64,
    pub forbidden: u64,
}

impl std::fmt::Display for FetchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requests, {} ok, {} rate limited, {} transient, {} exhausted, {} not found, {} forbidden",
            self.requests,
            self.successes,
            self.rate_limited,
            self.transient_failures,
            self.exhausted,
            self.not_found,
            self.forbidden
        )
    }
}
