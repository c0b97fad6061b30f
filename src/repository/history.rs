//! Scrape history audit log.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewScrapeHistory, ScrapeHistoryRecord};
use super::pool::{DbPool, DieselError};
use super::util::format_datetime;
use crate::models::ScrapeHistoryEntry;
use crate::schema::scrape_history;
use crate::with_conn;

/// Append-only repository of per-cycle handle scrape outcomes.
#[derive(Clone)]
pub struct ScrapeHistoryRepository {
    pool: DbPool,
}

impl ScrapeHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: &ScrapeHistoryEntry) -> Result<(), DieselError> {
        let scraped_at = format_datetime(&entry.scraped_at);
        let row = NewScrapeHistory {
            username: &entry.username,
            videos_found: entry.videos_found,
            shop_videos_found: entry.shop_videos_found,
            success: entry.success,
            error: entry.error.as_deref(),
            status: entry.status.as_str(),
            scraped_at: &scraped_at,
        };

        with_conn!(self.pool, conn => {
            diesel::insert_into(scrape_history::table)
                .values(&row)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Most recent entries for a handle, newest first.
    pub async fn for_handle(
        &self,
        username: &str,
        limit: i64,
    ) -> Result<Vec<ScrapeHistoryRecord>, DieselError> {
        with_conn!(self.pool, conn => {
            scrape_history::table
                .filter(scrape_history::username.eq(username))
                .order(scrape_history::id.desc())
                .limit(limit)
                .load::<ScrapeHistoryRecord>(&mut conn)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HandleStatus;
    use crate::repository::test_support::setup_test_db;
    use chrono::Utc;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let (repos, _dir) = setup_test_db().await;
        let history = &repos.history;

        for (found, success) in [(3, true), (0, false)] {
            history
                .append(&ScrapeHistoryEntry {
                    username: "alice".to_string(),
                    videos_found: found,
                    shop_videos_found: 1,
                    success,
                    error: (!success).then(|| "forbidden".to_string()),
                    status: HandleStatus::Active,
                    scraped_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let entries = history.for_handle("alice", 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].success);
        assert_eq!(entries[0].error.as_deref(), Some("forbidden"));
        assert_eq!(entries[1].videos_found, 3);
    }
}
