//! Product references embedded in share links and shop anchors.
//!
//! Both sources are best effort. Anything that fails to decode yields `None`
//! or empty fields and never an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::json::{extract_path, first_string};

static SHARE_LINK_PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:placeholder_)?product_id(?:=|"\s*:\s*"?|%3D)(\d+)"#).unwrap()
});

/// Product details carried by a matched shop anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopAnchor {
    pub product_id: Option<String>,
    pub title: Option<String>,
    pub cover: Option<String>,
}

/// Component keys that mark a commerce anchor.
pub fn is_shop_anchor(component_key: &str) -> bool {
    component_key.contains("anchor_complex_shop") || component_key == "anchor_shop"
}

/// Product id embedded in a share link, after URL-decoding it.
pub fn product_id_from_share_link(link: &str) -> Option<String> {
    let decoded = urlencoding::decode(link)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| link.to_string());
    SHARE_LINK_PRODUCT_ID
        .captures(&decoded)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First shop anchor on a raw video entry.
///
/// Returns `Some` whenever an anchor with a shop component key exists, even if
/// its payload could not be read; the fields are then empty.
pub fn find_shop_anchor(entry: &Value) -> Option<ShopAnchor> {
    let anchors = entry.get("anchors")?.as_array()?;
    anchors
        .iter()
        .find(|anchor| {
            anchor
                .get("component_key")
                .and_then(Value::as_str)
                .is_some_and(is_shop_anchor)
        })
        .map(|anchor| {
            anchor
                .get("extra")
                .and_then(parse_anchor_extra)
                .unwrap_or_default()
        })
}

/// Decode an anchor `extra` payload into product details.
pub fn parse_anchor_extra(extra: &Value) -> Option<ShopAnchor> {
    let decoded = decode_embedded(extra)?;
    let mut product = first_object(&decoded)?.clone();

    // Some payloads wrap the product in one more string-encoded `extra`.
    if let Some(inner) = product.get("extra").and_then(decode_embedded) {
        if let Some(obj) = first_object(&inner) {
            product = obj.clone();
        }
    }

    let anchor = ShopAnchor {
        product_id: first_string(&product, &["product_id", "id"]),
        title: first_string(
            &product,
            &["title", "product_name", "keyword", "elastic_title"],
        ),
        cover: first_string(&product, &["cover", "cover_url", "image.url_list.0", "images.0"])
            .or_else(|| first_string(extract_path(&product, "images.0"), &["url", "url_list.0"])),
    };

    Some(anchor)
}

/// Accept either a JSON value or a string holding JSON.
fn decode_embedded(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => serde_json::from_str(s).ok(),
        Value::Null => None,
        other => Some(other.clone()),
    }
}

fn first_object(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(_) => Some(value),
        Value::Array(items) => items.iter().find(|item| item.is_object()),
        _ => None,
    }
}
