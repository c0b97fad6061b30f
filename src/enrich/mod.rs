//! Product enrichment: cache-aside lookup with a blacklist for products
//! that can never be fetched.

mod product;

pub use product::{first_product, parse_product_detail};

use std::fmt;

use tracing::{debug, info, warn};

use crate::models::ProductMetadata;
use crate::rate_limit::FetchError;
use crate::repository::{DieselError, Repositories};
use crate::runner::run_pool;
use crate::shutdown::Shutdown;
use crate::upstream::UpstreamApi;

/// Blacklist reason for a product whose fetches kept failing.
pub const REASON_EXHAUSTED: &str = "exhausted";
/// Blacklist reason for a response without a usable product.
pub const REASON_MALFORMED: &str = "malformed";
/// Blacklist reason for a product the catalog does not know.
pub const REASON_NOT_FOUND: &str = "not_found";

/// What enriching one product did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// Served from the cache; no upstream call.
    CacheHit { videos_updated: usize },
    /// Fetched, cached, and propagated.
    Fetched { videos_updated: usize },
    /// Referencing videos deleted and the product blacklisted.
    Blacklisted { reason: String, videos_deleted: usize },
    /// Already blacklisted; leftover references were removed.
    AlreadyBlacklisted { videos_deleted: usize },
    /// Left for a later cycle.
    Deferred { reason: String },
}

/// Tally of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub processed: usize,
    pub cache_hits: usize,
    pub fetched: usize,
    pub blacklisted: usize,
    pub deferred: usize,
    pub failed: usize,
    pub videos_updated: usize,
    pub videos_deleted: usize,
}

impl EnrichSummary {
    fn record(&mut self, result: &Result<EnrichOutcome, DieselError>) {
        self.processed += 1;
        match result {
            Ok(EnrichOutcome::CacheHit { videos_updated }) => {
                self.cache_hits += 1;
                self.videos_updated += videos_updated;
            }
            Ok(EnrichOutcome::Fetched { videos_updated }) => {
                self.fetched += 1;
                self.videos_updated += videos_updated;
            }
            Ok(EnrichOutcome::Blacklisted { videos_deleted, .. }) => {
                self.blacklisted += 1;
                self.videos_deleted += videos_deleted;
            }
            Ok(EnrichOutcome::AlreadyBlacklisted { videos_deleted }) => {
                self.videos_deleted += videos_deleted;
            }
            Ok(EnrichOutcome::Deferred { .. }) => self.deferred += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for EnrichSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} products: {} cached, {} fetched, {} blacklisted, {} deferred, {} failed; {} videos updated, {} deleted",
            self.processed,
            self.cache_hits,
            self.fetched,
            self.blacklisted,
            self.deferred,
            self.failed,
            self.videos_updated,
            self.videos_deleted
        )
    }
}

/// Resolves product metadata and copies it onto referencing videos.
#[derive(Clone)]
pub struct Enricher {
    api: UpstreamApi,
    repos: Repositories,
}

impl Enricher {
    pub fn new(api: UpstreamApi, repos: Repositories) -> Self {
        Self { api, repos }
    }

    pub fn api(&self) -> &UpstreamApi {
        &self.api
    }

    /// Enrich one product.
    pub async fn enrich(&self, product_id: &str) -> Result<EnrichOutcome, DieselError> {
        if self.repos.products.is_blacklisted(product_id).await? {
            let videos_deleted = self.repos.videos.delete_by_product(product_id).await?;
            return Ok(EnrichOutcome::AlreadyBlacklisted { videos_deleted });
        }

        if let Some(cached) = self.repos.products.get_cached(product_id).await? {
            let videos_updated = self.repos.videos.apply_product(&cached).await?;
            debug!("[product {}] Cache hit, updated {} videos", product_id, videos_updated);
            return Ok(EnrichOutcome::CacheHit { videos_updated });
        }

        let body = match self.api.product_detail(product_id).await {
            Ok(body) => body,
            Err(FetchError::Exhausted { .. }) => {
                return self.abandon(product_id, REASON_EXHAUSTED).await;
            }
            Err(FetchError::Decode(_)) => {
                return self.abandon(product_id, REASON_MALFORMED).await;
            }
            Err(FetchError::NotFound) => {
                return self.abandon(product_id, REASON_NOT_FOUND).await;
            }
            Err(e) => {
                warn!("[product {}] Deferred: {}", product_id, e);
                return Ok(EnrichOutcome::Deferred {
                    reason: e.to_string(),
                });
            }
        };

        let Some(product) = parse_product_detail(product_id, &body) else {
            return self.abandon(product_id, REASON_MALFORMED).await;
        };

        let stored = self.cache(product).await?;
        let videos_updated = self.repos.videos.apply_product(&stored).await?;
        info!(
            "[product {}] Enriched \"{}\", updated {} videos",
            product_id, stored.name, videos_updated
        );
        Ok(EnrichOutcome::Fetched { videos_updated })
    }

    /// Write-once cache; if another worker got there first, use its entry.
    async fn cache(&self, product: ProductMetadata) -> Result<ProductMetadata, DieselError> {
        if self.repos.products.cache(&product).await? {
            return Ok(product);
        }
        Ok(self
            .repos
            .products
            .get_cached(&product.product_id)
            .await?
            .unwrap_or(product))
    }

    /// Delete referencing videos, then blacklist the product.
    async fn abandon(&self, product_id: &str, reason: &str) -> Result<EnrichOutcome, DieselError> {
        let videos_deleted = self.repos.videos.delete_by_product(product_id).await?;
        self.repos.products.blacklist(product_id, reason).await?;
        warn!(
            "[product {}] Blacklisted ({}), deleted {} videos",
            product_id, reason, videos_deleted
        );
        Ok(EnrichOutcome::Blacklisted {
            reason: reason.to_string(),
            videos_deleted,
        })
    }

    /// Enrich many products with at most `workers` in flight.
    ///
    /// All workers share this enricher's upstream queue, so the wire rate is
    /// unchanged by the worker count.
    pub async fn enrich_all(
        &self,
        product_ids: Vec<String>,
        workers: usize,
        shutdown: &Shutdown,
    ) -> EnrichSummary {
        let enricher = self.clone();
        let results = run_pool(product_ids, workers, shutdown, move |product_id: String| {
            let enricher = enricher.clone();
            async move {
                let result = enricher.enrich(&product_id).await;
                if let Err(ref e) = result {
                    warn!("[product {}] Store error: {}", product_id, e);
                }
                result
            }
        })
        .await;

        let mut summary = EnrichSummary::default();
        for result in &results {
            summary.record(result);
        }
        summary
    }
}
