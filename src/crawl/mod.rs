//! Pagination over hashtag and creator listings.

mod paginator;

pub use paginator::Paginator;

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::rate_limit::FetchError;

/// Default listing page size.
pub const DEFAULT_PAGE_SIZE: u32 = 30;
/// Default cap on pages requested per source.
pub const DEFAULT_MAX_PAGES: u32 = 20;
/// Default number of failed pages in a row that abandons a source.
pub const DEFAULT_PAGE_FAILURE_LIMIT: u32 = 5;

/// One pagination sequence: a hashtag or a creator handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrawlSource {
    Hashtag(String),
    Handle(String),
}

impl CrawlSource {
    /// Value stored in the video `source` column.
    pub fn tag(&self) -> String {
        match self {
            CrawlSource::Hashtag(tag) => format!("hashtag:{tag}"),
            CrawlSource::Handle(username) => format!("handle:{username}"),
        }
    }

    pub fn is_handle(&self) -> bool {
        matches!(self, CrawlSource::Handle(_))
    }
}

impl fmt::Display for CrawlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlSource::Hashtag(tag) => write!(f, "#{tag}"),
            CrawlSource::Handle(username) => write!(f, "@{username}"),
        }
    }
}

/// Where a source ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingState {
    Paging,
    /// Ran out of pages or hit the page cap.
    Done,
    /// Hashtag that upstream no longer serves.
    Skipped,
    /// Permanent failure (handles) or too many bad pages in a row.
    Failed,
}

impl PagingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PagingState::Paging => "paging",
            PagingState::Done => "done",
            PagingState::Skipped => "skipped",
            PagingState::Failed => "failed",
        }
    }
}

/// Pagination limits.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    pub page_size: u32,
    pub max_pages: u32,
    pub page_failure_limit: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            page_failure_limit: DEFAULT_PAGE_FAILURE_LIMIT,
        }
    }
}

/// Result of driving one source to completion.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: CrawlSource,
    pub state: PagingState,
    /// Pages that returned a usable payload.
    pub pages_fetched: u32,
    /// Pages skipped after exhausting retries or failing to decode.
    pub pages_failed: u32,
    /// Every video with an id, shop-tagged or not.
    pub videos_seen: u32,
    pub shop_videos: u32,
    /// Shop videos dropped because their product is blacklisted.
    pub blacklisted: u32,
    pub upserted: u32,
    pub latest_post: Option<DateTime<Utc>>,
    /// Failure that ended the source, if any.
    pub error: Option<FetchError>,
}

impl SourceOutcome {
    pub fn new(source: CrawlSource) -> Self {
        Self {
            source,
            state: PagingState::Paging,
            pages_fetched: 0,
            pages_failed: 0,
            videos_seen: 0,
            shop_videos: 0,
            blacklisted: 0,
            upserted: 0,
            latest_post: None,
            error: None,
        }
    }

    /// Whether any seen video was posted within `window` of `now`.
    pub fn posted_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.latest_post
            .is_some_and(|posted| posted <= now && now - posted <= window)
    }
}
