//! Listing page envelope accessors.

use serde_json::Value;

use super::json::{as_flag, extract_path};

const ENTRY_PATHS: &[&str] = &["data.videos", "data.aweme_list", "videos"];
const HAS_MORE_PATHS: &[&str] = &["data.hasMore", "data.has_more", "hasMore"];

/// Raw video entries of a listing page. Empty when the page has none.
pub fn page_entries(page: &Value) -> &[Value] {
    ENTRY_PATHS
        .iter()
        .find_map(|path| extract_path(page, path).as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Upstream "has more" flag. A missing flag means no more pages.
pub fn page_has_more(page: &Value) -> bool {
    HAS_MORE_PATHS
        .iter()
        .map(|path| extract_path(page, path))
        .find(|value| !value.is_null())
        .is_some_and(as_flag)
}
