//! Product detail payload parsing.

use serde_json::Value;

use crate::extract::{as_f64, as_string, extract_path, first_string};
use crate::models::ProductMetadata;

/// First product object of a detail response, if the response is well-formed.
pub fn first_product(body: &Value) -> Option<&Value> {
    extract_path(body, "data.products")
        .as_array()
        .and_then(|products| products.first())
        .filter(|product| product.is_object())
}

/// Catalog metadata from a detail response. `None` when malformed.
pub fn parse_product_detail(product_id: &str, body: &Value) -> Option<ProductMetadata> {
    let product = first_product(body)?;

    let name = first_string(product, &["title", "product_name"]).unwrap_or_default();
    let image = first_image(product).unwrap_or_default();
    let price = product_price(product)
        .or_else(|| product.get("price").and_then(product_price))
        .unwrap_or_default();
    let shop_name = first_string(product, &["shop_name", "seller.name", "shop.name"]).unwrap_or_default();

    Some(ProductMetadata::new(product_id, name, image, price, shop_name))
}

fn first_image(product: &Value) -> Option<String> {
    let image = extract_path(product, "images.0");
    as_string(image).or_else(|| first_string(image, &["url_list.0", "url"]))
}

/// Explicit original price string first, then the numeric real price.
fn product_price(value: &Value) -> Option<String> {
    if let Some(original) = value.get("original_price").and_then(as_string) {
        return Some(original);
    }
    let real = value.get("real_price")?;
    match as_f64(real) {
        Some(amount) => Some(format_amount(amount)),
        None => as_string(real),
    }
}

/// Decimal amount without trailing zeros ("9.9", "10").
fn format_amount(amount: f64) -> String {
    format!("{amount}")
}
