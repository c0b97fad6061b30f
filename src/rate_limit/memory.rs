//! In-memory pacing backend for single-process operation.
//!
//! State is not persisted across restarts and is not shared between the
//! discovery and enrichment processes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::backend::{RateLimitBackend, RateLimitResult};

/// In-memory pacing backend.
///
/// Maps each key to the earliest instant its next request may be dispatched.
/// The tokio mutex queues waiters in arrival order, which makes slot
/// assignment FIFO across concurrent callers.
#[derive(Clone, Default)]
pub struct InMemoryRateLimitBackend {
    next_free: Arc<Mutex<HashMap<String, Instant>>>,
}

impl InMemoryRateLimitBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitBackend for InMemoryRateLimitBackend {
    async fn reserve(&self, key: &str, interval: Duration) -> RateLimitResult<Duration> {
        let mut next_free = self.next_free.lock().await;
        let now = Instant::now();

        let entry = next_free.entry(key.to_string()).or_insert(now);
        let slot = (*entry).max(now);
        *entry = slot + interval;

        Ok(slot - now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_reservation_is_immediate() {
        let backend = InMemoryRateLimitBackend::new();
        let wait = backend
            .reserve("upstream", Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(wait, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_reservations_are_spaced_by_interval() {
        let backend = InMemoryRateLimitBackend::new();
        let interval = Duration::from_millis(100);

        let mut waits = Vec::new();
        for _ in 0..4 {
            waits.push(backend.reserve("upstream", interval).await.unwrap());
        }

        // Queued slots stack up: ~0, ~100, ~200, ~300ms
        for (i, wait) in waits.iter().enumerate() {
            let expected = interval * i as u32;
            assert!(*wait <= expected);
            assert!(*wait + Duration::from_millis(20) >= expected);
        }
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let backend = InMemoryRateLimitBackend::new();
        let interval = Duration::from_secs(1);

        backend.reserve("a", interval).await.unwrap();
        let wait = backend.reserve("b", interval).await.unwrap();
        assert_eq!(wait, Duration::ZERO);

        let wait = backend.reserve("a", interval).await.unwrap();
        assert!(wait > Duration::from_millis(900));
    }
}
