//! Pluggable backend trait for request pacing state.

use async_trait::async_trait;
use std::time::Duration;

/// Result type for rate limit operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;

/// Errors from rate limit backend operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Storage for "next free dispatch slot" per pacing key.
///
/// Implementations must hand out slots in the order `reserve` calls arrive
/// and must never give two callers slots closer together than `interval`.
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Reserve the next dispatch slot for `key`.
    /// Returns how long the caller has to wait before sending.
    async fn reserve(&self, key: &str, interval: Duration) -> RateLimitResult<Duration>;
}
