//! shopcrawl library.
//!
//! Discovers short-form videos that carry commerce product links, tracks the
//! creators who post them, and fills in catalog metadata for each product.
//! The `videos` and `products` cycles run as separate processes over a shared
//! store.

pub mod cli;
pub mod config;
pub mod crawl;
pub mod enrich;
pub mod extract;
pub mod http_client;
pub mod lifecycle;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod runner;
pub mod schema;
pub mod shutdown;
pub mod upstream;
