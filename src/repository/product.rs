//! Product cache and blacklist store.
//!
//! Both collections are written with insert-if-absent semantics so that the
//! discovery and enrichment processes can race on them safely.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{BlacklistRecord, NewBlacklistEntry, ProductCacheRecord};
use super::pool::{DbPool, DieselError};
use super::util::{format_datetime, parse_datetime};
use crate::models::ProductMetadata;
use crate::schema::{product_blacklist, product_cache};
use crate::with_conn;

impl From<ProductCacheRecord> for ProductMetadata {
    fn from(record: ProductCacheRecord) -> Self {
        ProductMetadata {
            product_id: record.product_id,
            name: record.name,
            image: record.image,
            price: record.price,
            shop_name: record.shop_name,
            fetched_at: parse_datetime(&record.fetched_at),
        }
    }
}

/// Repository for cached product metadata and blacklisted products.
#[derive(Clone)]
pub struct ProductRepository {
    pool: DbPool,
}

impl ProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_cached(&self, product_id: &str) -> Result<Option<ProductMetadata>, DieselError> {
        with_conn!(self.pool, conn => {
            product_cache::table
                .find(product_id)
                .first::<ProductCacheRecord>(&mut conn)
                .await
                .optional()
                .map(|record| record.map(ProductMetadata::from))
        })
    }

    /// Write a cache entry unless one already exists. Returns true if inserted.
    pub async fn cache(&self, product: &ProductMetadata) -> Result<bool, DieselError> {
        let record = ProductCacheRecord {
            product_id: product.product_id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            price: product.price.clone(),
            shop_name: product.shop_name.clone(),
            fetched_at: format_datetime(&product.fetched_at),
        };

        with_conn!(self.pool, conn => {
            let rows = diesel::insert_into(product_cache::table)
                .values(&record)
                .on_conflict_do_nothing()
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// Blacklist a product unless already present. Returns true if inserted.
    pub async fn blacklist(&self, product_id: &str, reason: &str) -> Result<bool, DieselError> {
        let now = format_datetime(&Utc::now());
        let entry = NewBlacklistEntry {
            product_id,
            reason,
            created_at: &now,
        };

        with_conn!(self.pool, conn => {
            let rows = diesel::insert_into(product_blacklist::table)
                .values(&entry)
                .on_conflict_do_nothing()
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    pub async fn is_blacklisted(&self, product_id: &str) -> Result<bool, DieselError> {
        with_conn!(self.pool, conn => {
            let count: i64 = product_blacklist::table
                .filter(product_blacklist::product_id.eq(product_id))
                .count()
                .get_result(&mut conn)
                .await?;
            Ok(count > 0)
        })
    }

    /// Subset of `product_ids` that is blacklisted.
    pub async fn blacklisted_among(&self, product_ids: &[String]) -> Result<Vec<String>, DieselError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        with_conn!(self.pool, conn => {
            product_blacklist::table
                .filter(product_blacklist::product_id.eq_any(product_ids))
                .select(product_blacklist::product_id)
                .load::<String>(&mut conn)
                .await
        })
    }

    pub async fn get_blacklist_entry(&self, product_id: &str) -> Result<Option<BlacklistRecord>, DieselError> {
        with_conn!(self.pool, conn => {
            product_blacklist::table
                .find(product_id)
                .first::<BlacklistRecord>(&mut conn)
                .await
                .optional()
        })
    }

    pub async fn count_cached(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn => {
            product_cache::table.count().get_result::<i64>(&mut conn).await
        })
    }

    pub async fn count_blacklisted(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn => {
            product_blacklist::table.count().get_result::<i64>(&mut conn).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;

    #[tokio::test]
    async fn test_cache_is_write_once() {
        let (repos, _dir) = setup_test_db().await;
        let products = &repos.products;

        assert!(products.get_cached("P1").await.unwrap().is_none());

        let first = ProductMetadata::new("P1", "Widget", "img", "9.99", "Shop");
        assert!(products.cache(&first).await.unwrap());

        let second = ProductMetadata::new("P1", "Renamed", "img2", "1.00", "Other");
        assert!(!products.cache(&second).await.unwrap());

        let cached = products.get_cached("P1").await.unwrap().unwrap();
        assert_eq!(cached.name, "Widget");
        assert_eq!(cached.price, "9.99");
        assert_eq!(products.count_cached().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blacklist_insert_if_absent() {
        let (repos, _dir) = setup_test_db().await;
        let products = &repos.products;

        assert!(!products.is_blacklisted("P9").await.unwrap());
        assert!(products.blacklist("P9", "exhausted").await.unwrap());
        assert!(!products.blacklist("P9", "malformed").await.unwrap());
        assert!(products.is_blacklisted("P9").await.unwrap());

        let entry = products.get_blacklist_entry("P9").await.unwrap().unwrap();
        assert_eq!(entry.reason, "exhausted");

        let ids = vec!["P1".to_string(), "P9".to_string()];
        assert_eq!(products.blacklisted_among(&ids).await.unwrap(), vec!["P9"]);
        assert!(products.blacklisted_among(&[]).await.unwrap().is_empty());
        assert_eq!(products.count_blacklisted().await.unwrap(), 1);
    }
}
