//! HTTP response wrapper.

use std::collections::HashMap;

/// Fully-read upstream response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, headers: HashMap<String, String>, body: String) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response with no headers (used by scripted transports).
    pub fn from_body(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, HashMap::new(), body.into())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(HttpResponse::from_body(204, "").is_success());
        assert!(HttpResponse::from_body(429, "").is_rate_limited());
        assert!(HttpResponse::from_body(503, "").is_server_error());
        assert!(!HttpResponse::from_body(404, "").is_server_error());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), "12".to_string());
        let response = HttpResponse::new(429, headers, String::new());
        assert_eq!(response.header("Retry-After"), Some("12"));
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn test_json_body() {
        let response = HttpResponse::from_body(200, r#"{"data":{"hasMore":true}}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["data"]["hasMore"], serde_json::json!(true));
        assert!(HttpResponse::from_body(200, "<html>")
            .json::<serde_json::Value>()
            .is_err());
    }
}
