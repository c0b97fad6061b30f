//! Enrichment cycle: every product still missing display fields.

use async_trait::async_trait;
use tracing::info;

use super::Cycle;
use crate::enrich::{EnrichSummary, Enricher};
use crate::rate_limit::FetchStats;
use crate::repository::Repositories;
use crate::shutdown::Shutdown;

/// Enriches every product referenced by videos with missing display fields.
#[derive(Clone)]
pub struct EnrichmentCycle {
    enricher: Enricher,
    repos: Repositories,
    workers: usize,
    batch: Option<i64>,
}

impl EnrichmentCycle {
    pub fn new(enricher: Enricher, repos: Repositories, workers: usize, batch: Option<i64>) -> Self {
        Self {
            enricher,
            repos,
            workers,
            batch,
        }
    }
}

#[async_trait]
impl Cycle for EnrichmentCycle {
    type Summary = EnrichSummary;

    fn name(&self) -> &'static str {
        "products"
    }

    async fn run_once(&self, shutdown: &Shutdown) -> anyhow::Result<EnrichSummary> {
        let pending = self.repos.videos.pending_product_ids(self.batch).await?;
        if pending.is_empty() {
            info!("No products awaiting enrichment");
            return Ok(EnrichSummary::default());
        }

        info!("Enriching {} products with {} workers", pending.len(), self.workers);
        Ok(self.enricher.enrich_all(pending, self.workers, shutdown).await)
    }

    fn fetch_stats(&self) -> FetchStats {
        self.enricher.api().stats()
    }
}
