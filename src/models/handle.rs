//! Creator handle model.

// Allow from_str methods that don't implement FromStr trait (returns Option, not Result)
#![allow(clippy::should_implement_trait)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crawl status of a creator handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HandleStatus {
    /// Crawled every discovery cycle.
    Active,
    /// Suspended; kept but skipped by future cycles.
    Inactive,
    /// Permanently dropped.
    Removed,
}

impl HandleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Removed => "removed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Active, Self::Inactive, Self::Removed]
    }
}

impl std::fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a handle first entered the tracked set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Hashtag,
    Manual,
    Mention,
}

impl DiscoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hashtag => "hashtag",
            Self::Manual => "manual",
            Self::Mention => "mention",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hashtag" => Some(Self::Hashtag),
            "manual" => Some(Self::Manual),
            "mention" => Some(Self::Mention),
            _ => None,
        }
    }
}

/// A tracked creator account.
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    pub username: String,
    pub status: HandleStatus,
    pub discovery_source: DiscoverySource,
    pub last_scraped: Option<DateTime<Utc>>,
    /// Cumulative videos found across all cycles.
    pub total_videos: i64,
    /// Cumulative shop-tagged videos found across all cycles.
    pub shop_videos: i64,
    /// Consecutive cycles with no shop-tagged video.
    pub no_shop_streak: i32,
    /// Consecutive cycles with no video posted in the recent window.
    pub no_posts_streak: i32,
    pub created_at: DateTime<Utc>,
}

impl Handle {
    /// Create a new active handle with zeroed statistics.
    pub fn new(username: impl Into<String>, discovery_source: DiscoverySource) -> Self {
        Self {
            username: username.into(),
            status: HandleStatus::Active,
            discovery_source,
            last_scraped: None,
            total_videos: 0,
            shop_videos: 0,
            no_shop_streak: 0,
            no_posts_streak: 0,
            created_at: Utc::now(),
        }
    }

    /// Shop-tagged videos divided by total videos, 0 when nothing was seen.
    pub fn shop_ratio(&self) -> f64 {
        if self.total_videos <= 0 {
            0.0
        } else {
            self.shop_videos as f64 / self.total_videos as f64
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == HandleStatus::Active
    }
}
