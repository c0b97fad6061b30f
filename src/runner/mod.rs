//! Long-running discovery and enrichment cycles.
//!
//! Each cycle runs as its own process. They share nothing in memory; all
//! coordination goes through the store.

mod enrichment;
mod pool;
mod videos;

pub use enrichment::EnrichmentCycle;
pub use pool::run_pool;
pub use videos::{VideoCycle, VideoCycleSummary};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::rate_limit::FetchStats;
use crate::shutdown::Shutdown;

/// Timing and concurrency for the cycle loops.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    /// Concurrent units of work (sources or products).
    pub workers: usize,
    /// Pause between discovery cycles.
    pub video_idle: Duration,
    /// Pause between enrichment cycles.
    pub product_idle: Duration,
    /// Pause after a cycle fails outright.
    pub error_delay: Duration,
    /// Upper bound on products taken per enrichment cycle.
    pub product_batch: Option<i64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            video_idle: Duration::from_secs(300),
            product_idle: Duration::from_secs(60),
            error_delay: Duration::from_secs(60),
            product_batch: None,
        }
    }
}

/// One pass of a long-running job.
#[async_trait]
pub trait Cycle: Send + Sync {
    type Summary: fmt::Display + Send;

    fn name(&self) -> &'static str;

    async fn run_once(&self, shutdown: &Shutdown) -> anyhow::Result<Self::Summary>;

    /// Upstream counters accumulated so far.
    fn fetch_stats(&self) -> FetchStats;
}

/// Run `cycle` until shutdown, sleeping `idle` between passes.
///
/// A failed pass is logged and retried after `error_delay`; it never ends the loop.
pub async fn run_forever<C: Cycle>(
    cycle: &C,
    idle: Duration,
    error_delay: Duration,
    shutdown: &Shutdown,
) {
    let mut pass: u64 = 0;
    while !shutdown.is_triggered() {
        pass += 1;
        let delay = match cycle.run_once(shutdown).await {
            Ok(summary) => {
                info!("[{}] Cycle {} finished: {}", cycle.name(), pass, summary);
                info!("[{}] Upstream: {}", cycle.name(), cycle.fetch_stats());
                idle
            }
            Err(e) => {
                error!(
                    "[{}] Cycle {} failed: {:#}. Retrying in {:?}",
                    cycle.name(),
                    pass,
                    e,
                    error_delay
                );
                error_delay
            }
        };

        if !shutdown.sleep(delay).await {
            break;
        }
    }
    info!("[{}] Stopped after {} cycles", cycle.name(), pass);
}
