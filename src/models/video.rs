//! Harvested video model.

use chrono::{DateTime, Duration, Utc};

/// Display fields of the product a video links to.
///
/// Every field is optional: the extractor fills what the shop anchor carries,
/// enrichment fills the rest from the product catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub name: Option<String>,
    pub image: Option<String>,
    pub price: Option<String>,
    pub shop_name: Option<String>,
}

impl ProductFields {
    /// True when no display field is missing.
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.image.is_some()
            && self.price.is_some()
            && self.shop_name.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image.is_none()
            && self.price.is_none()
            && self.shop_name.is_none()
    }
}

/// A single short-form video in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    /// Platform-assigned identifier (immutable, globally unique).
    pub video_id: String,
    pub author: String,
    pub caption: String,
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub play_url: Option<String>,
    pub cover_url: Option<String>,
    /// Duration in seconds.
    pub duration: Option<i64>,
    /// "W:H" in lowest terms, empty when unknown.
    pub aspect_ratio: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub has_shop: bool,
    pub product_id: Option<String>,
    pub product: ProductFields,
}

impl VideoRecord {
    /// Create a bare record with only an identifier and author.
    pub fn new(video_id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            author: author.into(),
            caption: String::new(),
            views: 0,
            likes: 0,
            shares: 0,
            comments: 0,
            play_url: None,
            cover_url: None,
            duration: None,
            aspect_ratio: String::new(),
            posted_at: None,
            has_shop: false,
            product_id: None,
            product: ProductFields::default(),
        }
    }

    /// Whether the video was posted within `window` of `now`.
    pub fn posted_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.posted_at
            .is_some_and(|posted| posted <= now && now - posted <= window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posted_within_window() {
        let now = Utc::now();
        let mut video = VideoRecord::new("1", "alice");
        assert!(!video.posted_within(Duration::hours(24), now));

        video.posted_at = Some(now - Duration::hours(3));
        assert!(video.posted_within(Duration::hours(24), now));

        video.posted_at = Some(now - Duration::hours(25));
        assert!(!video.posted_within(Duration::hours(24), now));
    }

    #[test]
    fn test_product_fields_completeness() {
        let mut fields = ProductFields::default();
        assert!(fields.is_empty());
        assert!(!fields.is_complete());

        fields.name = Some("Widget".to_string());
        assert!(!fields.is_empty());
        assert!(!fields.is_complete());

        fields.image = Some("https://img".to_string());
        fields.price = Some("9.99".to_string());
        fields.shop_name = Some("Shop".to_string());
        assert!(fields.is_complete());
    }
}
