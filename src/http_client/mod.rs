//! HTTP transport for the upstream content API.
//!
//! `Transport` is the single seam between the fetch queue and the network.
//! `HttpClient` is the reqwest-backed implementation; tests substitute a
//! scripted transport.

mod response;

pub use response::HttpResponse;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Default user agent for upstream requests.
pub const USER_AGENT: &str = concat!("shopcrawl/", env!("CARGO_PKG_VERSION"));

/// One upstream API call: a path relative to the API base URL plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of a query parameter, if present.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Failure before any HTTP status was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Sends a single request and returns whatever status the server gave.
///
/// Implementations never retry; retry and pacing policy live in the fetch queue.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed upstream client with static API key headers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    headers: Vec<(String, String)>,
}

/// Builder for constructing `HttpClient`.
pub struct HttpClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
}

impl HttpClientBuilder {
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }

    /// Add a header sent with every request (API key, API host).
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<HttpClient, TransportError> {
        let user_agent = self.user_agent.as_deref().unwrap_or(USER_AGENT);
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("failed to create HTTP client: {e}")))?;

        Ok(HttpClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            headers: self.headers,
        })
    }
}

impl HttpClient {
    pub fn builder(base_url: &str, timeout: Duration) -> HttpClientBuilder {
        HttpClientBuilder {
            base_url: base_url.to_string(),
            timeout,
            user_agent: None,
            headers: Vec::new(),
        }
    }

    /// Full URL for a request, query string included.
    pub fn url_for(&self, request: &ApiRequest) -> Result<url::Url, TransportError> {
        let path = request.path.trim_start_matches('/');
        let mut url = url::Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

fn extract_response_headers(response: &reqwest::Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(request)?;
        let started = Instant::now();

        let mut builder = self.client.get(url);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = extract_response_headers(&response);
        let body = response.text().await?;

        debug!(
            "GET {} -> {} in {}ms",
            request.describe(),
            status,
            started.elapsed().as_millis()
        );

        Ok(HttpResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_base_and_query() {
        let client = HttpClient::builder("https://api.example.com/", Duration::from_secs(5))
            .header("X-Key", "secret")
            .build()
            .unwrap();
        let request = ApiRequest::new("/user/posts")
            .param("unique_id", "alice")
            .param("count", 30)
            .param("offset", 0);

        let url = client.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/user/posts?unique_id=alice&count=30&offset=0"
        );
    }

    #[test]
    fn test_request_params() {
        let request = ApiRequest::new("/product/detail").param("product_id", "P1");
        assert_eq!(request.get_param("product_id"), Some("P1"));
        assert_eq!(request.get_param("missing"), None);
        assert_eq!(request.describe(), "/product/detail?product_id=P1");
    }
}
