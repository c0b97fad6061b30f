//! Drives one source through successive listing pages.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{CrawlConfig, CrawlSource, PagingState, SourceOutcome};
use crate::extract::{extract_videos, page_entries, page_has_more};
use crate::models::VideoRecord;
use crate::rate_limit::FetchError;
use crate::repository::Repositories;
use crate::upstream::UpstreamApi;

/// Sequential pager: page N+1 is never requested before page N is stored.
#[derive(Clone)]
pub struct Paginator {
    api: UpstreamApi,
    repos: Repositories,
    config: CrawlConfig,
}

impl Paginator {
    pub fn new(api: UpstreamApi, repos: Repositories, config: CrawlConfig) -> Self {
        Self { api, repos, config }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn api(&self) -> &UpstreamApi {
        &self.api
    }

    /// Crawl `source` until it runs dry, fails permanently, or hits the page cap.
    pub async fn crawl(&self, source: CrawlSource) -> SourceOutcome {
        let mut outcome = SourceOutcome::new(source);
        let mut offset: u64 = 0;
        let mut failures_in_row: u32 = 0;

        for _ in 0..self.config.max_pages {
            let page = match self.fetch_page(&outcome.source, offset).await {
                Ok(page) => page,
                Err(e) if e.is_permanent_source() => {
                    outcome.state = if outcome.source.is_handle() {
                        PagingState::Failed
                    } else {
                        PagingState::Skipped
                    };
                    warn!("[{}] {} at offset {}, stopping", outcome.source, e, offset);
                    outcome.error = Some(e);
                    break;
                }
                Err(e) => {
                    outcome.pages_failed += 1;
                    failures_in_row += 1;
                    warn!(
                        "[{}] Skipping page at offset {}: {}",
                        outcome.source, offset, e
                    );
                    if failures_in_row >= self.config.page_failure_limit {
                        warn!(
                            "[{}] {} failed pages in a row, giving up",
                            outcome.source, failures_in_row
                        );
                        outcome.state = PagingState::Failed;
                        outcome.error = Some(e);
                        break;
                    }
                    offset += u64::from(self.config.page_size);
                    continue;
                }
            };

            failures_in_row = 0;
            outcome.pages_fetched += 1;

            if let CrawlSource::Hashtag(tag) = &outcome.source {
                if let Err(e) = self.repos.raw_pages.record(tag, offset, &page).await {
                    warn!("[{}] Failed to record raw page: {}", outcome.source, e);
                }
            }

            if page_entries(&page).is_empty() {
                debug!("[{}] Empty page at offset {}", outcome.source, offset);
                outcome.state = PagingState::Done;
                break;
            }

            self.ingest_page(&page, &mut outcome).await;

            if !page_has_more(&page) {
                outcome.state = PagingState::Done;
                break;
            }
            offset += u64::from(self.config.page_size);
        }

        if outcome.state == PagingState::Paging {
            debug!(
                "[{}] Reached page cap of {}",
                outcome.source, self.config.max_pages
            );
            outcome.state = PagingState::Done;
        }

        info!(
            "[{}] {}: {} pages, {} videos, {} shop, {} stored",
            outcome.source,
            outcome.state.as_str(),
            outcome.pages_fetched,
            outcome.videos_seen,
            outcome.shop_videos,
            outcome.upserted
        );
        outcome
    }

    async fn fetch_page(&self, source: &CrawlSource, offset: u64) -> Result<Value, FetchError> {
        let count = self.config.page_size;
        match source {
            CrawlSource::Hashtag(tag) => self.api.hashtag_posts(tag, offset, count).await,
            CrawlSource::Handle(username) => self.api.user_posts(username, offset, count).await,
        }
    }

    async fn ingest_page(&self, page: &Value, outcome: &mut SourceOutcome) {
        let videos = extract_videos(std::slice::from_ref(page));
        outcome.videos_seen += videos.len() as u32;
        if let Some(latest) = videos.iter().filter_map(|v| v.posted_at).max() {
            outcome.latest_post = Some(outcome.latest_post.map_or(latest, |prev| prev.max(latest)));
        }

        let shop: Vec<VideoRecord> = videos.into_iter().filter(|v| v.has_shop).collect();
        outcome.shop_videos += shop.len() as u32;
        if shop.is_empty() {
            return;
        }

        let product_ids: Vec<String> = shop.iter().filter_map(|v| v.product_id.clone()).collect();
        let blacklisted = match self.repos.products.blacklisted_among(&product_ids).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    "[{}] Blacklist lookup failed, not storing page: {}",
                    outcome.source, e
                );
                return;
            }
        };

        let source_tag = outcome.source.tag();
        for video in shop {
            if video
                .product_id
                .as_ref()
                .is_some_and(|id| blacklisted.contains(id))
            {
                outcome.blacklisted += 1;
                continue;
            }
            match self.repos.videos.upsert(&video, &source_tag).await {
                Ok(()) => outcome.upserted += 1,
                Err(e) => warn!(
                    "[{}] Failed to store video {}: {}",
                    outcome.source, video.video_id, e
                ),
            }
        }
    }
}
