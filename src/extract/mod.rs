//! Raw upstream listing payloads to canonical video records.
//!
//! Everything here is pure: no I/O and no state, so the same pages always
//! produce the same records in the same order.

mod anchor;
mod json;
mod media;
mod page;

pub use anchor::{
    find_shop_anchor, is_shop_anchor, parse_anchor_extra, product_id_from_share_link, ShopAnchor,
};
pub use json::{as_f64, as_string, extract_path, first_i64, first_path, first_string};
pub use media::{aspect_ratio, normalize_duration};
pub use page::{page_entries, page_has_more};

use chrono::DateTime;
use serde_json::Value;

use crate::models::{ProductFields, VideoRecord};

/// Flatten listing pages into video records, dropping entries without an id.
pub fn extract_videos(pages: &[Value]) -> Vec<VideoRecord> {
    pages
        .iter()
        .flat_map(page_entries)
        .filter_map(extract_video)
        .collect()
}

/// Convert one raw entry. `None` when the entry has no video id.
pub fn extract_video(entry: &Value) -> Option<VideoRecord> {
    let video_id = first_string(entry, &["aweme_id", "video_id", "id"])?;
    let author = first_string(entry, &["author.unique_id", "author"]).unwrap_or_default();

    let mut video = VideoRecord::new(video_id, author);
    video.caption = first_string(entry, &["desc", "title"]).unwrap_or_default();
    video.views = counter(entry, "play_count");
    video.likes = counter(entry, "digg_count");
    video.shares = counter(entry, "share_count");
    video.comments = counter(entry, "comment_count");
    video.play_url = first_string(entry, &["play", "video.play_addr"]);
    video.cover_url = first_string(entry, &["cover", "video.cover"]);
    video.duration = normalize_duration(first_i64(entry, &["duration", "video.duration"]));
    video.aspect_ratio = aspect_ratio(
        first_i64(entry, &["width", "video.width"]),
        first_i64(entry, &["height", "video.height"]),
    );
    video.posted_at = first_i64(entry, &["create_time"])
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    let share_product = first_string(entry, &["share_url"])
        .as_deref()
        .and_then(product_id_from_share_link);
    let anchor = find_shop_anchor(entry);

    video.product_id = share_product.or_else(|| anchor.as_ref().and_then(|a| a.product_id.clone()));
    video.has_shop = video.product_id.is_some() || anchor.is_some();
    if let Some(anchor) = anchor {
        video.product = ProductFields {
            name: anchor.title,
            image: anchor.cover,
            ..ProductFields::default()
        };
    }

    Some(video)
}

fn counter(entry: &Value, key: &str) -> i64 {
    let nested = format!("statistics.{key}");
    first_i64(entry, &[key, nested.as_str()])
        .unwrap_or(0)
        .max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shop_entry() -> Value {
        json!({
            "aweme_id": "7301",
            "author": {"unique_id": "alice"},
            "desc": "look at this",
            "statistics": {"play_count": 1200, "digg_count": "34", "share_count": 2, "comment_count": 5},
            "play": "https://cdn/v.mp4",
            "cover": "https://cdn/c.jpg",
            "duration": 15000,
            "video": {"width": 1080, "height": 1920},
            "create_time": 1_700_000_000,
            "anchors": [{
                "component_key": "anchor_complex_shop",
                "extra": "[{\"product_id\":\"P1\",\"title\":\"Widget\",\"cover\":\"https://img/w.jpg\"}]"
            }]
        })
    }

    #[test]
    fn test_extract_full_entry() {
        let video = extract_video(&shop_entry()).unwrap();
        assert_eq!(video.video_id, "7301");
        assert_eq!(video.author, "alice");
        assert_eq!(video.caption, "look at this");
        assert_eq!(video.views, 1200);
        assert_eq!(video.likes, 34);
        assert_eq!(video.comments, 5);
        assert_eq!(video.duration, Some(15));
        assert_eq!(video.aspect_ratio, "9:16");
        assert_eq!(video.posted_at.unwrap().timestamp(), 1_700_000_000);
        assert!(video.has_shop);
        assert_eq!(video.product_id.as_deref(), Some("P1"));
        assert_eq!(video.product.name.as_deref(), Some("Widget"));
        assert_eq!(video.product.image.as_deref(), Some("https://img/w.jpg"));
        assert_eq!(video.product.price, None);
    }

    #[test]
    fn test_share_link_takes_precedence_over_anchor() {
        let mut entry = shop_entry();
        entry["share_url"] = json!("https://example.com/v?product_id%3D999");
        let video = extract_video(&entry).unwrap();
        assert_eq!(video.product_id.as_deref(), Some("999"));
    }

    #[test]
    fn test_plain_entry_has_no_shop() {
        let entry = json!({"video_id": 12, "author": "bob", "width": 0, "height": 720});
        let video = extract_video(&entry).unwrap();
        assert_eq!(video.video_id, "12");
        assert_eq!(video.author, "bob");
        assert_eq!(video.aspect_ratio, "");
        assert!(!video.has_shop);
        assert!(video.product.is_empty());
    }

    #[test]
    fn test_extract_videos_drops_missing_ids_and_keeps_order() {
        let pages = vec![
            json!({"data": {"videos": [{"aweme_id": "1"}, {"desc": "no id"}, {"aweme_id": "2"}]}}),
            json!({"data": {"aweme_list": [{"id": "3"}]}}),
            json!({"unexpected": true}),
        ];
        let ids: Vec<String> = extract_videos(&pages).into_iter().map(|v| v.video_id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(extract_videos(&pages).len(), 3);
    }
}
