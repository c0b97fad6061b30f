//! Discovery and enrichment cycles against a scripted upstream.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use shopcrawl::crawl::{CrawlConfig, Paginator};
use shopcrawl::enrich::Enricher;
use shopcrawl::http_client::{ApiRequest, HttpResponse, Transport, TransportError};
use shopcrawl::lifecycle::{LifecycleManager, LifecyclePolicy};
use shopcrawl::models::HandleStatus;
use shopcrawl::rate_limit::{
    FetchQueue, InMemoryRateLimitBackend, RateLimitConfig, RateLimiter, RetryPolicy,
};
use shopcrawl::repository::{DbContext, DbPool, Repositories};
use shopcrawl::runner::{Cycle, EnrichmentCycle, VideoCycle};
use shopcrawl::shutdown::Shutdown;
use shopcrawl::upstream::{UpstreamApi, UpstreamConfig};

/// Serves canned bodies per path; unknown paths answer 404.
#[derive(Default)]
struct CannedUpstream {
    responses: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl CannedUpstream {
    fn push(&self, path: &str, status: u16, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.to_string()));
    }

    fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for CannedUpstream {
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&request.path)
            .and_then(|q| q.pop_front());
        Ok(match next {
            Some((status, body)) => HttpResponse::from_body(status, body),
            None => HttpResponse::from_body(404, ""),
        })
    }
}

async fn open_store() -> (Repositories, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DbContext::new(DbPool::sqlite_from_path(&dir.path().join("e2e.db")));
    ctx.init_schema().await.unwrap();
    (Repositories::new(&ctx), dir)
}

fn api(upstream: Arc<CannedUpstream>) -> UpstreamApi {
    let limiter = RateLimiter::with_config(
        Arc::new(InMemoryRateLimitBackend::new()),
        RateLimitConfig {
            target_rps: 1000.0,
            rate_limit_backoff: Duration::from_millis(5),
        },
    );
    let fast = |n| RetryPolicy::new(n, Duration::from_millis(1), Duration::from_millis(2));
    UpstreamApi::new(FetchQueue::new(upstream, limiter), UpstreamConfig::default())
        .with_policies(fast(3), fast(5))
}

fn shop_video(id: &str, author: &str, product: &str) -> serde_json::Value {
    json!({
        "aweme_id": id,
        "title": format!("video {id}"),
        "create_time": chrono::Utc::now().timestamp(),
        "author": {"unique_id": author},
        "share_url": format!("https://example.com/v/{id}?product_id={product}"),
        "play_count": 1000,
        "digg_count": 50,
    })
}

fn video_cycle(upstream: Arc<CannedUpstream>, repos: &Repositories, hashtags: &[&str]) -> VideoCycle {
    let paginator = Paginator::new(api(upstream), repos.clone(), CrawlConfig::default());
    let lifecycle = LifecycleManager::new(repos.clone(), LifecyclePolicy::default());
    VideoCycle::new(
        paginator,
        lifecycle,
        repos.clone(),
        hashtags.iter().map(|s| s.to_string()).collect(),
        4,
    )
}

#[tokio::test]
async fn discovered_products_are_enriched_onto_videos() {
    let (repos, _dir) = open_store().await;
    let upstream = Arc::new(CannedUpstream::default());
    upstream.push(
        "/challenge/posts",
        200,
        json!({"data": {"videos": [shop_video("100", "alice", "P1")], "hasMore": false}}),
    );
    upstream.push(
        "/user/posts",
        200,
        json!({"data": {"videos": [shop_video("100", "alice", "P1")], "hasMore": false}}),
    );
    upstream.push(
        "/product/detail",
        200,
        json!({"data": {"products": [{
            "title": "Widget",
            "images": ["https://img.example.com/w.jpg"],
            "real_price": 12.5,
            "shop_name": "Widget Co"
        }]}}),
    );

    let videos = video_cycle(upstream.clone(), &repos, &["tiktokmademebuyit"]);
    let summary = videos.run_once(&Shutdown::never()).await.unwrap();
    assert_eq!(summary.handles_discovered, 1);
    assert_eq!(repos.videos.pending_product_ids(None).await.unwrap(), vec!["P1"]);

    let products = EnrichmentCycle::new(
        Enricher::new(api(upstream.clone()), repos.clone()),
        repos.clone(),
        4,
        None,
    );
    let enriched = products.run_once(&Shutdown::never()).await.unwrap();
    assert_eq!(enriched.fetched, 1);

    let video = repos.videos.get("100").await.unwrap().unwrap();
    assert_eq!(video.product.name.as_deref(), Some("Widget"));
    assert_eq!(video.product.shop_name.as_deref(), Some("Widget Co"));
    assert!(repos.products.get_cached("P1").await.unwrap().is_some());
    assert!(repos.videos.pending_product_ids(None).await.unwrap().is_empty());

    // A second pass finds nothing left to do and stays off the wire.
    let again = products.run_once(&Shutdown::never()).await.unwrap();
    assert_eq!(again.processed, 0);
    assert_eq!(upstream.calls_to("/product/detail"), 1);
}

#[tokio::test]
async fn blacklisted_products_are_not_stored_again() {
    let (repos, _dir) = open_store().await;
    repos.products.blacklist("P9", "not_found").await.unwrap();

    let upstream = Arc::new(CannedUpstream::default());
    upstream.push(
        "/challenge/posts",
        200,
        json!({"data": {"videos": [
            shop_video("1", "bob", "P9"),
            shop_video("2", "bob", "P2"),
        ], "hasMore": false}}),
    );

    let videos = video_cycle(upstream, &repos, &["deals"]);
    videos.run_once(&Shutdown::never()).await.unwrap();

    assert!(repos.videos.get("1").await.unwrap().is_none());
    assert!(repos.videos.get("2").await.unwrap().is_some());
}

#[tokio::test]
async fn missing_handle_is_removed() {
    let (repos, _dir) = open_store().await;
    let upstream = Arc::new(CannedUpstream::default());
    upstream.push(
        "/challenge/posts",
        200,
        json!({"data": {"videos": [shop_video("7", "ghost", "P3")], "hasMore": false}}),
    );

    let videos = video_cycle(upstream.clone(), &repos, &["deals"]);
    let summary = videos.run_once(&Shutdown::never()).await.unwrap();
    assert_eq!(summary.handles_removed, 1);

    let ghost = repos.handles.get("ghost").await.unwrap().unwrap();
    assert_eq!(ghost.status, HandleStatus::Removed);

    // Removed handles are never crawled again.
    videos.run_once(&Shutdown::never()).await.unwrap();
    assert_eq!(upstream.calls_to("/user/posts"), 1);
}

#[tokio::test]
async fn recrawling_anchored_videos_keeps_catalog_fields() {
    let (repos, _dir) = open_store().await;
    let upstream = Arc::new(CannedUpstream::default());
    let mut anchored = shop_video("42", "carol", "42");
    anchored["anchors"] = json!([{
        "component_key": "anchor_complex_shop",
        "extra": "[{\"product_id\":\"42\",\"title\":\"anchor title\",\"cover\":\"anchor.jpg\"}]"
    }]);
    let page = json!({"data": {"videos": [anchored], "hasMore": false}});
    upstream.push("/challenge/posts", 200, page.clone());
    upstream.push(
        "/product/detail",
        200,
        json!({"data": {"products": [{
            "title": "Widget",
            "images": ["w.jpg"],
            "real_price": 9.99,
            "shop_name": "Widget Co"
        }]}}),
    );
    upstream.push("/challenge/posts", 200, page);

    let videos = video_cycle(upstream.clone(), &repos, &["deals"]);
    videos.run_once(&Shutdown::never()).await.unwrap();
    assert_eq!(
        repos.videos.get("42").await.unwrap().unwrap().product.name.as_deref(),
        Some("anchor title")
    );

    let products = EnrichmentCycle::new(
        Enricher::new(api(upstream.clone()), repos.clone()),
        repos.clone(),
        2,
        None,
    );
    products.run_once(&Shutdown::never()).await.unwrap();

    videos.run_once(&Shutdown::never()).await.unwrap();

    let video = repos.videos.get("42").await.unwrap().unwrap();
    assert_eq!(video.product.name.as_deref(), Some("Widget"));
    assert_eq!(video.product.image.as_deref(), Some("w.jpg"));
    let cached = repos.products.get_cached("42").await.unwrap().unwrap();
    assert_eq!(video.product, cached.fields());
}
