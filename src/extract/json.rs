//! Loose JSON access helpers for upstream payloads.
//!
//! Upstream field names and value types drift between API versions, so
//! lookups take several candidate paths and accept numbers as strings and
//! vice versa.

use serde_json::Value;

/// Extract a value from nested JSON using dot-notation path.
pub fn extract_path<'a>(data: &'a Value, path: &str) -> &'a Value {
    if path.is_empty() {
        return data;
    }

    let mut current = data;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key).unwrap_or(&Value::Null),
            Value::Array(arr) => key
                .parse::<usize>()
                .ok()
                .and_then(|idx| arr.get(idx))
                .unwrap_or(&Value::Null),
            _ => &Value::Null,
        };
    }

    current
}

/// First candidate path that resolves to a non-null value.
pub fn first_path<'a>(data: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .map(|path| extract_path(data, path))
        .find(|value| !value.is_null())
}

/// Non-empty string from a string or number value.
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer from a number or numeric string value.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// Float from a number or numeric string value.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Truthiness of a flag that may arrive as bool, 0/1 or "true"/"false".
pub fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

/// First non-empty string among candidate paths.
pub fn first_string(data: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| as_string(extract_path(data, path)))
}

/// First integer among candidate paths.
pub fn first_i64(data: &Value, paths: &[&str]) -> Option<i64> {
    paths.iter().find_map(|path| as_i64(extract_path(data, path)))
}
