//! Global request pacer.
//!
//! Wraps a `RateLimitBackend` and keeps running counters of how the
//! upstream responded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::backend::RateLimitBackend;
use super::config::{FetchStats, RateLimitConfig};

/// Type alias for a shared rate limit backend.
pub type BoxedRateLimitBackend = Arc<dyn RateLimitBackend>;

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    successes: AtomicU64,
    rate_limited: AtomicU64,
    transient_failures: AtomicU64,
    exhausted: AtomicU64,
    not_found: AtomicU64,
    forbidden: AtomicU64,
}

/// Paces every outbound request for a key to the configured requests-per-second.
#[derive(Clone)]
pub struct RateLimiter {
    backend: BoxedRateLimitBackend,
    config: RateLimitConfig,
    counters: Arc<Counters>,
}

impl RateLimiter {
    pub fn new(backend: BoxedRateLimitBackend) -> Self {
        Self::with_config(backend, RateLimitConfig::default())
    }

    pub fn with_config(backend: BoxedRateLimitBackend, config: RateLimitConfig) -> Self {
        Self {
            backend,
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait for this caller's dispatch slot.
    pub async fn acquire(&self, key: &str) {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        match self.backend.reserve(key, self.config.min_interval()).await {
            Ok(wait_time) => {
                if wait_time > Duration::ZERO {
                    debug!("Pacing {}: waiting {:?}", key, wait_time);
                    tokio::time::sleep(wait_time).await;
                }
            }
            Err(e) => {
                // Fall back to the bare interval rather than sending unpaced
                warn!("Rate limit reserve failed for {}: {}", key, e);
                tokio::time::sleep(self.config.min_interval()).await;
            }
        }
    }

    /// Sleep out the fixed rate-limit backoff after an HTTP 429.
    pub async fn back_off(&self, key: &str) {
        self.counters.rate_limited.fetch_add(1, Ordering::Relaxed);
        warn!(
            "Rate limited by upstream ({}), backing off for {:?}",
            key, self.config.rate_limit_backoff
        );
        tokio::time::sleep(self.config.rate_limit_backoff).await;
    }

    pub fn report_success(&self) {
        self.counters.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_transient(&self) {
        self.counters.transient_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_exhausted(&self) {
        self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_not_found(&self) {
        self.counters.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_forbidden(&self) {
        self.counters.forbidden.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> FetchStats {
        let c = &self.counters;
        FetchStats {
            requests: c.requests.load(Ordering::Relaxed),
            successes: c.successes.load(Ordering::Relaxed),
            rate_limited: c.rate_limited.load(Ordering::Relaxed),
            transient_failures: c.transient_failures.load(Ordering::Relaxed),
            exhausted: c.exhausted.load(Ordering::Relaxed),
            not_found: c.not_found.load(Ordering::Relaxed),
            forbidden: c.forbidden.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
