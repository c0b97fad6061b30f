//! Creator handle discovery and status tracking.

mod policy;

pub use policy::{LifecycleEvent, LifecyclePolicy};

use chrono::Utc;
use tracing::{info, warn};

use crate::crawl::SourceOutcome;
use crate::models::{DiscoverySource, Handle, ScrapeHistoryEntry};
use crate::repository::{DieselError, Repositories};

/// Applies scrape outcomes to stored handles and records the audit trail.
#[derive(Clone)]
pub struct LifecycleManager {
    repos: Repositories,
    policy: LifecyclePolicy,
}

impl LifecycleManager {
    pub fn new(repos: Repositories, policy: LifecyclePolicy) -> Self {
        Self { repos, policy }
    }

    /// Track every video author not yet known as a handle.
    /// Returns the number of new handles.
    pub async fn discover_handles(&self) -> Result<usize, DieselError> {
        let authors = self.repos.videos.distinct_authors().await?;
        let mut added = 0;
        for author in authors.iter().filter(|a| !a.trim().is_empty()) {
            let handle = Handle::new(author.as_str(), DiscoverySource::Hashtag);
            match self.repos.handles.insert_if_absent(&handle).await {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => warn!("[@{}] Failed to track handle: {}", author, e),
            }
        }
        if added > 0 {
            info!("Discovered {} new handles", added);
        }
        Ok(added)
    }

    /// Fold a crawl outcome into `handle`, persist it, and append history.
    pub async fn record_outcome(
        &self,
        handle: &Handle,
        outcome: &SourceOutcome,
    ) -> Result<Handle, DieselError> {
        let now = Utc::now();
        let event = LifecycleEvent::from_outcome(outcome, self.policy.recent_window, now);
        let updated = self.policy.apply(handle, &event, now);

        if updated.status != handle.status {
            info!(
                "[@{}] {} -> {} ({:?})",
                handle.username,
                handle.status,
                updated.status,
                event
            );
        }

        self.repos.handles.save(&updated).await?;

        let entry = ScrapeHistoryEntry {
            username: updated.username.clone(),
            videos_found: outcome.videos_seen as i32,
            shop_videos_found: outcome.shop_videos as i32,
            success: event.is_success(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
            status: updated.status,
            scraped_at: now,
        };
        if let Err(e) = self.repos.history.append(&entry).await {
            warn!("[@{}] Failed to record scrape history: {}", updated.username, e);
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::{CrawlSource, PagingState};
    use crate::models::{HandleStatus, VideoRecord};
    use crate::rate_limit::FetchError;
    use crate::repository::test_support::setup_test_db;

    #[tokio::test]
    async fn test_discover_handles_from_video_authors() {
        let (repos, _dir) = setup_test_db().await;
        for (id, author) in [("1", "alice"), ("2", "bob"), ("3", "alice"), ("4", "")] {
            repos
                .videos
                .upsert(&VideoRecord::new(id, author), "hashtag:deals")
                .await
                .unwrap();
        }
        let mut manual = Handle::new("bob", DiscoverySource::Manual);
        manual.total_videos = 9;
        repos.handles.save(&manual).await.unwrap();

        let manager = LifecycleManager::new(repos.clone(), LifecyclePolicy::default());
        assert_eq!(manager.discover_handles().await.unwrap(), 1);
        assert_eq!(manager.discover_handles().await.unwrap(), 0);

        let alice = repos.handles.get("alice").await.unwrap().unwrap();
        assert_eq!(alice.status, HandleStatus::Active);
        assert_eq!(alice.discovery_source, DiscoverySource::Hashtag);
        assert_eq!(alice.total_videos, 0);
        let bob = repos.handles.get("bob").await.unwrap().unwrap();
        assert_eq!(bob.total_videos, 9);
    }

    #[tokio::test]
    async fn test_record_outcome_persists_and_audits() {
        let (repos, _dir) = setup_test_db().await;
        let handle = Handle::new("gone", DiscoverySource::Hashtag);
        repos.handles.save(&handle).await.unwrap();

        let mut outcome = SourceOutcome::new(CrawlSource::Handle("gone".to_string()));
        outcome.state = PagingState::Failed;
        outcome.error = Some(FetchError::NotFound);

        let manager = LifecycleManager::new(repos.clone(), LifecyclePolicy::default());
        let updated = manager.record_outcome(&handle, &outcome).await.unwrap();
        assert_eq!(updated.status, HandleStatus::Removed);

        let stored = repos.handles.get("gone").await.unwrap().unwrap();
        assert_eq!(stored.status, HandleStatus::Removed);
        assert!(stored.last_scraped.is_some());

        let history = repos.history.for_handle("gone", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
        assert_eq!(history[0].status, "removed");
        assert_eq!(history[0].error.as_deref(), Some("not found"));
    }
}
