//! Upstream content API: listing and product detail requests.
//!
//! Every call goes through the shared `FetchQueue`, so the request ceiling
//! holds no matter how many sources or products are being worked on.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::ConfigError;
use crate::http_client::{ApiRequest, HttpClient, TransportError};
use crate::rate_limit::{
    FetchError, FetchQueue, FetchStats, InMemoryRateLimitBackend, RateLimitConfig, RateLimiter,
    RetryPolicy,
};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://tiktok-scraper7.p.rapidapi.com";
/// Default value for the API host header.
pub const DEFAULT_API_HOST: &str = "tiktok-scraper7.p.rapidapi.com";
/// Default listing region.
pub const DEFAULT_REGION: &str = "US";

/// Path and identifying query parameter of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub param: String,
}

impl Endpoint {
    pub fn new(path: &str, param: &str) -> Self {
        Self {
            path: path.to_string(),
            param: param.to_string(),
        }
    }
}

/// Connection and endpoint settings for the upstream API.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_host: String,
    pub key_header: String,
    pub host_header: String,
    pub region: String,
    pub hashtag_endpoint: Endpoint,
    pub user_endpoint: Endpoint,
    pub product_endpoint: Endpoint,
    pub request_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            api_host: DEFAULT_API_HOST.to_string(),
            key_header: "X-RapidAPI-Key".to_string(),
            host_header: "X-RapidAPI-Host".to_string(),
            region: DEFAULT_REGION.to_string(),
            hashtag_endpoint: Endpoint::new("/challenge/posts", "challenge_name"),
            user_endpoint: Endpoint::new("/user/posts", "unique_id"),
            product_endpoint: Endpoint::new("/product/detail", "product_id"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl UpstreamConfig {
    /// Check that the settings can actually reach the API.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("SHOPCRAWL_API_KEY".to_string()));
        }
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "upstream.base_url".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// reqwest client carrying the static key and host headers.
    pub fn build_client(&self) -> Result<HttpClient, TransportError> {
        HttpClient::builder(&self.base_url, self.request_timeout)
            .header(&self.key_header, &self.api_key)
            .header(&self.host_header, &self.api_host)
            .build()
    }
}

/// Typed access to the three upstream endpoints.
#[derive(Clone)]
pub struct UpstreamApi {
    queue: FetchQueue,
    config: Arc<UpstreamConfig>,
    listing_policy: RetryPolicy,
    product_policy: RetryPolicy,
}

impl UpstreamApi {
    pub fn new(queue: FetchQueue, config: UpstreamConfig) -> Self {
        Self {
            queue,
            config: Arc::new(config),
            listing_policy: RetryPolicy::listing(),
            product_policy: RetryPolicy::product(),
        }
    }

    /// Build the HTTP client, pacer and queue from configuration.
    pub fn connect(config: UpstreamConfig, rate: RateLimitConfig) -> Result<Self, TransportError> {
        let client = config.build_client()?;
        let limiter = RateLimiter::with_config(Arc::new(InMemoryRateLimitBackend::new()), rate);
        Ok(Self::new(FetchQueue::new(Arc::new(client), limiter), config))
    }

    pub fn with_policies(mut self, listing: RetryPolicy, product: RetryPolicy) -> Self {
        self.listing_policy = listing;
        self.product_policy = product;
        self
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    pub fn stats(&self) -> FetchStats {
        self.queue.stats()
    }

    pub fn hashtag_request(&self, tag: &str, offset: u64, count: u32) -> ApiRequest {
        self.listing_request(&self.config.hashtag_endpoint, tag, offset, count)
    }

    pub fn user_request(&self, username: &str, offset: u64, count: u32) -> ApiRequest {
        self.listing_request(&self.config.user_endpoint, username, offset, count)
    }

    pub fn product_request(&self, product_id: &str) -> ApiRequest {
        let endpoint = &self.config.product_endpoint;
        ApiRequest::new(&endpoint.path)
            .param(&endpoint.param, product_id)
            .param("region", &self.config.region)
    }

    fn listing_request(&self, endpoint: &Endpoint, value: &str, offset: u64, count: u32) -> ApiRequest {
        ApiRequest::new(&endpoint.path)
            .param(&endpoint.param, value)
            .param("count", count)
            .param("offset", offset)
            .param("region", &self.config.region)
    }

    /// One page of posts for a hashtag.
    pub async fn hashtag_posts(&self, tag: &str, offset: u64, count: u32) -> Result<Value, FetchError> {
        let request = self.hashtag_request(tag, offset, count);
        self.queue.submit(&request, &self.listing_policy).await
    }

    /// One page of posts for a creator.
    pub async fn user_posts(&self, username: &str, offset: u64, count: u32) -> Result<Value, FetchError> {
        let request = self.user_request(username, offset, count);
        self.queue.submit(&request, &self.listing_policy).await
    }

    /// Catalog detail for a product.
    pub async fn product_detail(&self, product_id: &str) -> Result<Value, FetchError> {
        let request = self.product_request(product_id);
        self.queue.submit(&request, &self.product_policy).await
    }
}
