//! Diesel records for shopcrawl tables.

use diesel::prelude::*;

use crate::schema::{handles, product_blacklist, product_cache, raw_pages, scrape_history, videos};

/// Video row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = videos, primary_key(video_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VideoRow {
    pub video_id: String,
    pub author: String,
    pub caption: String,
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub play_url: Option<String>,
    pub cover_url: Option<String>,
    pub duration: Option<i64>,
    pub aspect_ratio: String,
    pub posted_at: Option<String>,
    pub has_shop: bool,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub product_price: Option<String>,
    pub shop_name: Option<String>,
    pub source: String,
    pub first_seen_at: String,
    pub updated_at: String,
}

/// New video for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = videos)]
pub struct NewVideo<'a> {
    pub video_id: &'a str,
    pub author: &'a str,
    pub caption: &'a str,
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub play_url: Option<&'a str>,
    pub cover_url: Option<&'a str>,
    pub duration: Option<i64>,
    pub aspect_ratio: &'a str,
    pub posted_at: Option<String>,
    pub has_shop: bool,
    pub product_id: Option<&'a str>,
    pub product_name: Option<&'a str>,
    pub product_image: Option<&'a str>,
    pub product_price: Option<&'a str>,
    pub shop_name: Option<&'a str>,
    pub source: &'a str,
    pub first_seen_at: &'a str,
    pub updated_at: &'a str,
}

/// Columns rewritten when an already-stored video is ingested again.
///
/// Product display fields are absent: after the first insert only enrichment
/// writes them. `None` fields are left untouched.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = videos)]
pub struct VideoChanges<'a> {
    pub author: &'a str,
    pub caption: &'a str,
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub play_url: Option<&'a str>,
    pub cover_url: Option<&'a str>,
    pub duration: Option<i64>,
    pub aspect_ratio: &'a str,
    pub posted_at: Option<String>,
    pub has_shop: bool,
    pub product_id: Option<&'a str>,
    pub source: &'a str,
    pub updated_at: &'a str,
}

/// Product display fields copied onto videos by enrichment.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = videos)]
pub struct VideoProductChanges<'a> {
    pub product_name: &'a str,
    pub product_image: &'a str,
    pub product_price: &'a str,
    pub shop_name: &'a str,
    pub updated_at: &'a str,
}

/// Product cache row.
#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = product_cache, primary_key(product_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductCacheRecord {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub price: String,
    pub shop_name: String,
    pub fetched_at: String,
}

/// Blacklist row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = product_blacklist, primary_key(product_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BlacklistRecord {
    pub product_id: String,
    pub reason: String,
    pub created_at: String,
}

/// New blacklist entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = product_blacklist)]
pub struct NewBlacklistEntry<'a> {
    pub product_id: &'a str,
    pub reason: &'a str,
    pub created_at: &'a str,
}

/// Handle row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = handles, primary_key(username))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HandleRecord {
    pub username: String,
    pub status: String,
    pub discovery_source: String,
    pub last_scraped: Option<String>,
    pub total_videos: i64,
    pub shop_videos: i64,
    pub shop_ratio: f64,
    pub no_shop_streak: i32,
    pub no_posts_streak: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Handle row for insertion and full-row updates.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = handles)]
pub struct NewHandle<'a> {
    pub username: &'a str,
    pub status: &'a str,
    pub discovery_source: &'a str,
    pub last_scraped: Option<String>,
    pub total_videos: i64,
    pub shop_videos: i64,
    pub shop_ratio: f64,
    pub no_shop_streak: i32,
    pub no_posts_streak: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Scrape history row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = scrape_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScrapeHistoryRecord {
    pub id: i32,
    pub username: String,
    pub videos_found: i32,
    pub shop_videos_found: i32,
    pub success: bool,
    pub error: Option<String>,
    pub status: String,
    pub scraped_at: String,
}

/// New scrape history entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = scrape_history)]
pub struct NewScrapeHistory<'a> {
    pub username: &'a str,
    pub videos_found: i32,
    pub shop_videos_found: i32,
    pub success: bool,
    pub error: Option<&'a str>,
    pub status: &'a str,
    pub scraped_at: &'a str,
}

/// Raw listing page row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = raw_pages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RawPageRecord {
    pub id: i32,
    pub tag: String,
    pub page_offset: i64,
    pub payload: String,
    pub fetched_at: String,
}

/// New raw listing page for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = raw_pages)]
pub struct NewRawPage<'a> {
    pub tag: &'a str,
    pub page_offset: i64,
    pub payload: &'a str,
    pub fetched_at: &'a str,
}
