//! Product catalog cache entry.

use chrono::{DateTime, Utc};

use super::ProductFields;

/// Catalog metadata for a product, written once on first successful fetch.
///
/// Fields the catalog did not provide are stored as empty strings so that
/// propagated videos no longer count as pending enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMetadata {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub price: String,
    pub shop_name: String,
    pub fetched_at: DateTime<Utc>,
}

impl ProductMetadata {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
        price: impl Into<String>,
        shop_name: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            image: image.into(),
            price: price.into(),
            shop_name: shop_name.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Display fields to copy onto referencing videos.
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: Some(self.name.clone()),
            image: Some(self.image.clone()),
            price: Some(self.price.clone()),
            shop_name: Some(self.shop_name.clone()),
        }
    }
}
