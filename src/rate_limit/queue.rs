//! Rate-limited fetch queue.
//!
//! Admission and retry are separate concerns here: every attempt, including
//! redispatches, waits for a slot from the shared `RateLimiter`, while the
//! per-request `RetryPolicy` only decides whether to try again.

use std::sync::Arc;

use tracing::{debug, warn};

use super::config::{FetchStats, RetryPolicy};
use super::limiter::RateLimiter;
use crate::http_client::{ApiRequest, Transport};

/// Pacing key shared by every upstream call.
pub const UPSTREAM_KEY: &str = "upstream";

/// Terminal outcome of a fetch that did not produce a usable body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// HTTP 404: the resource is gone.
    #[error("not found")]
    NotFound,
    /// HTTP 403: access denied.
    #[error("forbidden")]
    Forbidden,
    /// Any other non-retryable status.
    #[error("rejected with HTTP {0}")]
    Rejected(u16),
    /// The retry budget was spent on 5xx or transport failures.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
    /// 2xx response whose body is not JSON.
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether the failure says the source itself is permanently unusable.
    pub fn is_permanent_source(&self) -> bool {
        matches!(self, FetchError::NotFound | FetchError::Forbidden)
    }
}

/// Funnels all upstream calls through one pacer.
#[derive(Clone)]
pub struct FetchQueue {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
}

impl FetchQueue {
    pub fn new(transport: Arc<dyn Transport>, limiter: RateLimiter) -> Self {
        Self { transport, limiter }
    }

    pub fn stats(&self) -> FetchStats {
        self.limiter.stats()
    }

    /// Send `request` until it yields JSON or a terminal failure.
    pub async fn submit(
        &self,
        request: &ApiRequest,
        policy: &RetryPolicy,
    ) -> Result<serde_json::Value, FetchError> {
        let mut failures: u32 = 0;

        loop {
            self.limiter.acquire(UPSTREAM_KEY).await;

            let last_error = match self.transport.send(request).await {
                Ok(response) if response.is_success() => {
                    self.limiter.report_success();
                    return response
                        .json::<serde_json::Value>()
                        .map_err(|e| FetchError::Decode(e.to_string()));
                }
                Ok(response) if response.is_rate_limited() => {
                    if let Some(retry_after) = response.header("retry-after") {
                        debug!("{} asked to retry after {}", request.describe(), retry_after);
                    }
                    self.limiter.back_off(UPSTREAM_KEY).await;
                    continue;
                }
                Ok(response) if response.status == 404 => {
                    self.limiter.report_not_found();
                    return Err(FetchError::NotFound);
                }
                Ok(response) if response.status == 403 => {
                    self.limiter.report_forbidden();
                    return Err(FetchError::Forbidden);
                }
                Ok(response) if response.is_server_error() => format!("HTTP {}", response.status),
                Ok(response) => return Err(FetchError::Rejected(response.status)),
                Err(e) => e.to_string(),
            };

            failures += 1;
            self.limiter.report_transient();

            if failures >= policy.max_attempts {
                self.limiter.report_exhausted();
                warn!(
                    "Giving up on {} after {} attempts: {}",
                    request.describe(),
                    failures,
                    last_error
                );
                return Err(FetchError::Exhausted {
                    attempts: failures,
                    last_error,
                });
            }

            let delay = policy.jittered_delay();
            debug!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                failures,
                policy.max_attempts,
                request.describe(),
                last_error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use crate::rate_limit::{InMemoryRateLimitBackend, RateLimitConfig};
    use std::time::Duration;

    fn queue_with(transport: Arc<ScriptedTransport>) -> FetchQueue {
        let limiter = RateLimiter::with_config(
            Arc::new(InMemoryRateLimitBackend::new()),
            RateLimitConfig {
                target_rps: 1000.0,
                rate_limit_backoff: Duration::from_millis(5),
            },
        );
        FetchQueue::new(transport, limiter)
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_success_returns_json() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("/p", 200, r#"{"ok":true}"#);
        let queue = queue_with(transport.clone());

        let body = queue.submit(&ApiRequest::new("/p"), &fast_policy(3)).await.unwrap();
        assert_eq!(body["ok"], serde_json::json!(true));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_budget() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..10 {
            transport.push("/p", 503, "");
        }
        let queue = queue_with(transport.clone());

        let err = queue
            .submit(&ApiRequest::new("/p"), &fast_policy(3))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
        assert_eq!(transport.call_count(), 3);
        assert_eq!(queue.stats().exhausted, 1);
    }

    #[tokio::test]
    async fn test_rate_limits_do_not_consume_budget() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("/p", 500, "");
        for _ in 0..4 {
            transport.push("/p", 429, "");
        }
        transport.push_error("/p", "timed out");
        transport.push("/p", 200, r#"{"ok":1}"#);
        let queue = queue_with(transport.clone());

        let body = queue.submit(&ApiRequest::new("/p"), &fast_policy(3)).await.unwrap();
        assert_eq!(body["ok"], serde_json::json!(1));
        assert_eq!(transport.call_count(), 7);

        let stats = queue.stats();
        assert_eq!(stats.rate_limited, 4);
        assert_eq!(stats.transient_failures, 2);
        assert_eq!(stats.requests, 7);
    }

    #[tokio::test]
    async fn test_permanent_statuses() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("/gone", 404, "");
        transport.push("/denied", 403, "");
        transport.push("/bad", 400, "");
        transport.push("/html", 200, "<html></html>");
        let queue = queue_with(transport.clone());
        let policy = fast_policy(5);

        assert_eq!(
            queue.submit(&ApiRequest::new("/gone"), &policy).await,
            Err(FetchError::NotFound)
        );
        assert_eq!(
            queue.submit(&ApiRequest::new("/denied"), &policy).await,
            Err(FetchError::Forbidden)
        );
        assert_eq!(
            queue.submit(&ApiRequest::new("/bad"), &policy).await,
            Err(FetchError::Rejected(400))
        );
        assert!(matches!(
            queue.submit(&ApiRequest::new("/html"), &policy).await,
            Err(FetchError::Decode(_))
        ));
        assert_eq!(transport.call_count(), 4);
    }
}
