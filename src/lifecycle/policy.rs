//! Handle status transitions as a pure function of scrape events.

use chrono::{DateTime, Duration, Utc};

use crate::crawl::{PagingState, SourceOutcome};
use crate::models::{Handle, HandleStatus};
use crate::rate_limit::FetchError;

/// What happened when a handle was scraped.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Upstream says the account does not exist.
    NotFound,
    /// Upstream denies access to the account.
    Forbidden,
    /// Too many listing pages failed in a row.
    RepeatedPageFailures,
    /// All pages were processed.
    CycleCompleted {
        videos_found: i64,
        shop_videos_found: i64,
        posted_recently: bool,
    },
}

impl LifecycleEvent {
    /// Classify a handle crawl. `now` is when the crawl finished.
    pub fn from_outcome(outcome: &SourceOutcome, window: Duration, now: DateTime<Utc>) -> Self {
        match (&outcome.state, &outcome.error) {
            (PagingState::Done, _) => LifecycleEvent::CycleCompleted {
                videos_found: i64::from(outcome.videos_seen),
                shop_videos_found: i64::from(outcome.shop_videos),
                posted_recently: outcome.posted_within(window, now),
            },
            (_, Some(FetchError::NotFound)) => LifecycleEvent::NotFound,
            (_, Some(FetchError::Forbidden)) => LifecycleEvent::Forbidden,
            _ => LifecycleEvent::RepeatedPageFailures,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LifecycleEvent::CycleCompleted { .. })
    }
}

/// Thresholds for retiring handles.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecyclePolicy {
    /// Cycles in a row without a recent post before removal.
    pub no_posts_limit: i32,
    /// Cycles in a row without a shop video before removal.
    pub no_shop_limit: i32,
    /// Minimum cumulative shop ratio once `ratio_min_videos` is exceeded.
    pub min_shop_ratio: f64,
    pub ratio_min_videos: i64,
    /// Window that counts as "recent" for the no-posts streak.
    pub recent_window: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            no_posts_limit: 7,
            no_shop_limit: 14,
            min_shop_ratio: 0.10,
            ratio_min_videos: 50,
            recent_window: Duration::hours(24),
        }
    }
}

impl LifecyclePolicy {
    /// Next status for a handle in `current` after `event`.
    ///
    /// `updated` carries the counters after the event was folded in.
    /// Only active handles move; inactive and removed are terminal here.
    pub fn next_status(
        &self,
        current: HandleStatus,
        event: &LifecycleEvent,
        updated: &Handle,
    ) -> HandleStatus {
        if current != HandleStatus::Active {
            return current;
        }
        match event {
            LifecycleEvent::NotFound => HandleStatus::Removed,
            LifecycleEvent::Forbidden | LifecycleEvent::RepeatedPageFailures => {
                HandleStatus::Inactive
            }
            LifecycleEvent::CycleCompleted { .. } => {
                if updated.no_posts_streak >= self.no_posts_limit
                    || updated.no_shop_streak >= self.no_shop_limit
                    || (updated.total_videos > self.ratio_min_videos
                        && updated.shop_ratio() < self.min_shop_ratio)
                {
                    HandleStatus::Removed
                } else {
                    HandleStatus::Active
                }
            }
        }
    }

    /// Fold `event` into `handle`, returning the updated copy.
    pub fn apply(&self, handle: &Handle, event: &LifecycleEvent, now: DateTime<Utc>) -> Handle {
        let mut updated = handle.clone();
        updated.last_scraped = Some(now);

        if let LifecycleEvent::CycleCompleted {
            videos_found,
            shop_videos_found,
            posted_recently,
        } = event
        {
            updated.total_videos += videos_found;
            updated.shop_videos += shop_videos_found;
            updated.no_posts_streak = if *posted_recently {
                0
            } else {
                updated.no_posts_streak + 1
            };
            updated.no_shop_streak = if *shop_videos_found > 0 {
                0
            } else {
                updated.no_shop_streak + 1
            };
        }

        updated.status = self.next_status(handle.status, event, &updated);
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::CrawlSource;
    use crate::models::DiscoverySource;

    fn quiet_cycle() -> LifecycleEvent {
        LifecycleEvent::CycleCompleted {
            videos_found: 3,
            shop_videos_found: 1,
            posted_recently: false,
        }
    }

    #[test]
    fn test_inactivity_removes_after_seven_cycles() {
        let policy = LifecyclePolicy::default();
        let now = Utc::now();
        let mut handle = Handle::new("alice", DiscoverySource::Hashtag);

        for _ in 0..6 {
            handle = policy.apply(&handle, &quiet_cycle(), now);
        }
        assert_eq!(handle.no_posts_streak, 6);
        assert_eq!(handle.status, HandleStatus::Active);

        handle = policy.apply(&handle, &quiet_cycle(), now);
        assert_eq!(handle.status, HandleStatus::Removed);
    }

    #[test]
    fn test_recent_post_resets_streak() {
        let policy = LifecyclePolicy::default();
        let mut handle = Handle::new("alice", DiscoverySource::Hashtag);
        handle.no_posts_streak = 6;
        let event = LifecycleEvent::CycleCompleted {
            videos_found: 2,
            shop_videos_found: 1,
            posted_recently: true,
        };
        let updated = policy.apply(&handle, &event, Utc::now());
        assert_eq!(updated.no_posts_streak, 0);
        assert_eq!(updated.status, HandleStatus::Active);
    }

    #[test]
    fn test_no_shop_streak_removes_at_fourteen() {
        let policy = LifecyclePolicy::default();
        let event = LifecycleEvent::CycleCompleted {
            videos_found: 1,
            shop_videos_found: 0,
            posted_recently: true,
        };
        let mut handle = Handle::new("bob", DiscoverySource::Manual);
        handle.no_shop_streak = 12;
        handle = policy.apply(&handle, &event, Utc::now());
        assert_eq!(handle.status, HandleStatus::Active);
        handle = policy.apply(&handle, &event, Utc::now());
        assert_eq!(handle.no_shop_streak, 14);
        assert_eq!(handle.status, HandleStatus::Removed);
    }

    #[test]
    fn test_low_shop_ratio_only_counts_past_minimum() {
        let policy = LifecyclePolicy::default();
        let mut handle = Handle::new("carol", DiscoverySource::Hashtag);
        let event = LifecycleEvent::CycleCompleted {
            videos_found: 50,
            shop_videos_found: 1,
            posted_recently: true,
        };
        handle = policy.apply(&handle, &event, Utc::now());
        assert_eq!(handle.total_videos, 50);
        assert_eq!(handle.status, HandleStatus::Active);

        let event = LifecycleEvent::CycleCompleted {
            videos_found: 1,
            shop_videos_found: 1,
            posted_recently: true,
        };
        handle = policy.apply(&handle, &event, Utc::now());
        assert_eq!(handle.total_videos, 51);
        assert_eq!(handle.status, HandleStatus::Removed);
    }

    #[test]
    fn test_failure_events() {
        let policy = LifecyclePolicy::default();
        let handle = Handle::new("dan", DiscoverySource::Hashtag);
        let now = Utc::now();

        assert_eq!(
            policy.apply(&handle, &LifecycleEvent::NotFound, now).status,
            HandleStatus::Removed
        );
        assert_eq!(
            policy.apply(&handle, &LifecycleEvent::Forbidden, now).status,
            HandleStatus::Inactive
        );
        let failed = policy.apply(&handle, &LifecycleEvent::RepeatedPageFailures, now);
        assert_eq!(failed.status, HandleStatus::Inactive);
        assert_eq!(failed.total_videos, 0);
        assert_eq!(failed.last_scraped, Some(now));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        let policy = LifecyclePolicy::default();
        let mut handle = Handle::new("erin", DiscoverySource::Hashtag);
        handle.status = HandleStatus::Inactive;
        let event = LifecycleEvent::CycleCompleted {
            videos_found: 5,
            shop_videos_found: 5,
            posted_recently: true,
        };
        assert_eq!(
            policy.next_status(HandleStatus::Inactive, &event, &handle),
            HandleStatus::Inactive
        );
        assert_eq!(
            policy.next_status(HandleStatus::Removed, &LifecycleEvent::Forbidden, &handle),
            HandleStatus::Removed
        );
    }

    #[test]
    fn test_event_from_outcome() {
        let now = Utc::now();
        let window = Duration::hours(24);
        let mut outcome = SourceOutcome::new(CrawlSource::Handle("f".to_string()));

        outcome.state = PagingState::Failed;
        outcome.error = Some(FetchError::Forbidden);
        assert_eq!(LifecycleEvent::from_outcome(&outcome, window, now), LifecycleEvent::Forbidden);

        outcome.error = Some(FetchError::Decode("bad".to_string()));
        assert_eq!(
            LifecycleEvent::from_outcome(&outcome, window, now),
            LifecycleEvent::RepeatedPageFailures
        );

        outcome.state = PagingState::Done;
        outcome.error = None;
        outcome.videos_seen = 4;
        outcome.shop_videos = 2;
        outcome.latest_post = Some(now - Duration::hours(1));
        assert_eq!(
            LifecycleEvent::from_outcome(&outcome, window, now),
            LifecycleEvent::CycleCompleted {
                videos_found: 4,
                shop_videos_found: 2,
                posted_recently: true,
            }
        );
    }
}
