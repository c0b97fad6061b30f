//! Per-cycle handle scrape audit entry.

use chrono::{DateTime, Utc};

use super::HandleStatus;

/// Append-only record of one handle scrape attempt.
#[derive(Debug, Clone)]
pub struct ScrapeHistoryEntry {
    pub username: String,
    pub videos_found: i32,
    pub shop_videos_found: i32,
    pub success: bool,
    pub error: Option<String>,
    /// Handle status after the attempt was evaluated.
    pub status: HandleStatus,
    pub scraped_at: DateTime<Utc>,
}
