//! Raw hashtag listing pages kept for debugging.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewRawPage, RawPageRecord};
use super::pool::{DbPool, DieselError};
use super::util::format_datetime;
use crate::schema::raw_pages;
use crate::with_conn;

/// Write-only audit of hashtag listing payloads.
#[derive(Clone)]
pub struct RawPageRepository {
    pool: DbPool,
}

impl RawPageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        tag: &str,
        offset: u64,
        payload: &serde_json::Value,
    ) -> Result<(), DieselError> {
        let payload = payload.to_string();
        let fetched_at = format_datetime(&Utc::now());
        let row = NewRawPage {
            tag,
            page_offset: offset as i64,
            payload: &payload,
            fetched_at: &fetched_at,
        };

        with_conn!(self.pool, conn => {
            diesel::insert_into(raw_pages::table)
                .values(&row)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    pub async fn for_tag(&self, tag: &str) -> Result<Vec<RawPageRecord>, DieselError> {
        with_conn!(self.pool, conn => {
            raw_pages::table
                .filter(raw_pages::tag.eq(tag))
                .order(raw_pages::id.asc())
                .load::<RawPageRecord>(&mut conn)
                .await
        })
    }
}
