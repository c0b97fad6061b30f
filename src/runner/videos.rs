//! Discovery cycle: hashtags, then handle discovery, then active handles.

use std::fmt;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{run_pool, Cycle};
use crate::crawl::{CrawlSource, PagingState, Paginator, SourceOutcome};
use crate::lifecycle::LifecycleManager;
use crate::models::{Handle, HandleStatus};
use crate::rate_limit::FetchStats;
use crate::repository::Repositories;
use crate::shutdown::Shutdown;

/// Totals for one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoCycleSummary {
    pub hashtags: usize,
    pub handles: usize,
    pub pages: u32,
    pub failed_pages: u32,
    pub videos_upserted: u32,
    pub handles_discovered: usize,
    pub handles_deactivated: usize,
    pub handles_removed: usize,
}

impl VideoCycleSummary {
    fn add_outcome(&mut self, outcome: &SourceOutcome) {
        self.pages += outcome.pages_fetched;
        self.failed_pages += outcome.pages_failed;
        self.videos_upserted += outcome.upserted;
    }
}

impl fmt::Display for VideoCycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hashtags, {} handles, {} pages ({} failed), {} videos stored, {} new handles, {} deactivated, {} removed",
            self.hashtags,
            self.handles,
            self.pages,
            self.failed_pages,
            self.videos_upserted,
            self.handles_discovered,
            self.handles_deactivated,
            self.handles_removed
        )
    }
}

/// Crawls configured hashtags and every active handle.
#[derive(Clone)]
pub struct VideoCycle {
    paginator: Paginator,
    lifecycle: LifecycleManager,
    repos: Repositories,
    hashtags: Vec<String>,
    workers: usize,
}

impl VideoCycle {
    pub fn new(
        paginator: Paginator,
        lifecycle: LifecycleManager,
        repos: Repositories,
        hashtags: Vec<String>,
        workers: usize,
    ) -> Self {
        Self {
            paginator,
            lifecycle,
            repos,
            hashtags,
            workers,
        }
    }

    async fn crawl_hashtags(&self, shutdown: &Shutdown, summary: &mut VideoCycleSummary) {
        let sources: Vec<CrawlSource> = self
            .hashtags
            .iter()
            .map(|tag| CrawlSource::Hashtag(tag.trim_start_matches('#').to_string()))
            .collect();

        let paginator = self.paginator.clone();
        let outcomes = run_pool(sources, self.workers, shutdown, move |source| {
            let paginator = paginator.clone();
            async move { paginator.crawl(source).await }
        })
        .await;

        for outcome in &outcomes {
            summary.hashtags += 1;
            summary.add_outcome(outcome);
            if outcome.state == PagingState::Skipped {
                warn!("[{}] Hashtag unavailable, skipped", outcome.source);
            }
        }
    }

    async fn crawl_handles(
        &self,
        handles: Vec<Handle>,
        shutdown: &Shutdown,
        summary: &mut VideoCycleSummary,
    ) {
        let paginator = self.paginator.clone();
        let lifecycle = self.lifecycle.clone();
        let results = run_pool(handles, self.workers, shutdown, move |handle: Handle| {
            let paginator = paginator.clone();
            let lifecycle = lifecycle.clone();
            async move {
                let outcome = paginator
                    .crawl(CrawlSource::Handle(handle.username.clone()))
                    .await;
                let updated = match lifecycle.record_outcome(&handle, &outcome).await {
                    Ok(updated) => Some(updated),
                    Err(e) => {
                        warn!("[@{}] Failed to update handle: {}", handle.username, e);
                        None
                    }
                };
                (outcome, updated)
            }
        })
        .await;

        for (outcome, updated) in &results {
            summary.handles += 1;
            summary.add_outcome(outcome);
            match updated.as_ref().map(|h| h.status) {
                Some(HandleStatus::Inactive) => summary.handles_deactivated += 1,
                Some(HandleStatus::Removed) => summary.handles_removed += 1,
                _ => {}
            }
        }
    }
}

#[async_trait]
impl Cycle for VideoCycle {
    type Summary = VideoCycleSummary;

    fn name(&self) -> &'static str {
        "videos"
    }

    async fn run_once(&self, shutdown: &Shutdown) -> anyhow::Result<VideoCycleSummary> {
        let mut summary = VideoCycleSummary::default();

        if !self.hashtags.is_empty() {
            info!("Crawling {} hashtags", self.hashtags.len());
            self.crawl_hashtags(shutdown, &mut summary).await;
        }

        summary.handles_discovered = self.lifecycle.discover_handles().await?;

        let handles = self.repos.handles.active(None).await?;
        info!("Crawling {} active handles", handles.len());
        self.crawl_handles(handles, shutdown, &mut summary).await;

        Ok(summary)
    }

    fn fetch_stats(&self) -> FetchStats {
        self.paginator.api().stats()
    }
}
