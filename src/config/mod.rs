//! Configuration management for shopcrawl using the prefer crate.

mod loader;
mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::http_client::TransportError;
use crate::rate_limit::{RateLimitConfig, MIN_TARGET_RPS};
use crate::repository::util::{is_postgres_url, redact_url_password};

pub use loader::{apply_env_overrides, load_settings_with_options, LoadOptions};
pub use settings::Settings;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "shopcrawl.db";

/// Invalid or missing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    MissingValue(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error(transparent)]
    Client(#[from] TransportError),
}

/// `[upstream]` section: API endpoint, credentials and request pacing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct UpstreamSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtag_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_path: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Global requests per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rps: Option<f64>,
    /// Sleep after HTTP 429, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_backoff: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_retries: Option<u32>,
    /// Jitter bounds between retries, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_min_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_max_delay_ms: Option<u64>,
}

/// `[crawl]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct CrawlSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_failure_limit: Option<u32>,
}

/// `[schedule]` section. Durations are in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct ScheduleSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_idle: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_idle: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_batch: Option<u64>,
}

/// `[lifecycle]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct LifecycleSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_posts_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_shop_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_shop_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio_min_videos: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_window_hours: Option<u64>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename or URL.
    /// A plain filename is joined with data_dir; a URL is used as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Hashtags crawled at the start of every discovery cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[prefer(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    #[prefer(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    #[prefer(default)]
    pub crawl: CrawlSection,
    #[serde(default)]
    #[prefer(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    #[prefer(default)]
    pub lifecycle: LifecycleSection,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a config file with prefer; defaults when none is found.
    pub async fn load() -> Self {
        match prefer::load("shopcrawl").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// The format follows the extension: TOML, YAML, or JSON otherwise.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let read_error = |message: String| ConfigError::Read {
            path: path.to_path_buf(),
            message,
        };
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| read_error(e.to_string()))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| read_error(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| read_error(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| read_error(e.to_string()))?,
        };

        config.validate()?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Reject values that cannot be turned into settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rps) = self.upstream.target_rps {
            if !RateLimitConfig::is_valid_rps(rps) {
                return Err(ConfigError::InvalidValue {
                    key: "upstream.target_rps".to_string(),
                    message: format!("{rps} is below the minimum of {MIN_TARGET_RPS}"),
                });
            }
        }
        if let Some(hours) = self.lifecycle.recent_window_hours {
            if recent_window(hours).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "lifecycle.recent_window_hours".to_string(),
                    message: format!("{hours} hours is out of range"),
                });
            }
        }
        Ok(())
    }

    /// Directory of the config file, used to resolve relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// `~` is expanded; relative paths are joined onto `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            if database.contains("://") || database.starts_with("sqlite:") {
                if is_postgres_url(database) && !cfg!(feature = "postgres") {
                    tracing::warn!(
                        "Ignoring PostgreSQL database {} (built without the postgres feature)",
                        redact_url_password(database)
                    );
                } else {
                    settings.database_url = Some(database.clone());
                }
            } else {
                settings.database_filename = database.clone();
            }
        }
        if !self.hashtags.is_empty() {
            settings.hashtags = self.hashtags.clone();
        }

        let up = &self.upstream;
        let upstream = &mut settings.upstream;
        set_string(&mut upstream.base_url, &up.base_url);
        set_string(&mut upstream.api_key, &up.api_key);
        set_string(&mut upstream.api_host, &up.api_host);
        set_string(&mut upstream.key_header, &up.key_header);
        set_string(&mut upstream.host_header, &up.host_header);
        set_string(&mut upstream.region, &up.region);
        set_string(&mut upstream.hashtag_endpoint.path, &up.hashtag_path);
        set_string(&mut upstream.user_endpoint.path, &up.user_path);
        set_string(&mut upstream.product_endpoint.path, &up.product_path);
        if let Some(timeout) = up.request_timeout {
            upstream.request_timeout = std::time::Duration::from_secs(timeout);
        }
        if let Some(rps) = up.target_rps.filter(|rps| RateLimitConfig::is_valid_rps(*rps)) {
            settings.rate_limit.target_rps = rps;
        }
        if let Some(backoff) = up.rate_limit_backoff {
            settings.rate_limit.rate_limit_backoff = std::time::Duration::from_secs(backoff);
        }
        if let Some(retries) = up.listing_retries {
            settings.listing_retry.max_attempts = retries.max(1);
        }
        if let Some(retries) = up.product_retries {
            settings.product_retry.max_attempts = retries.max(1);
        }
        for policy in [&mut settings.listing_retry, &mut settings.product_retry] {
            if let Some(ms) = up.retry_min_delay_ms {
                policy.min_delay = std::time::Duration::from_millis(ms);
            }
            if let Some(ms) = up.retry_max_delay_ms {
                policy.max_delay = std::time::Duration::from_millis(ms);
            }
        }

        let crawl = &mut settings.crawl;
        if let Some(size) = self.crawl.page_size {
            crawl.page_size = size.max(1);
        }
        if let Some(pages) = self.crawl.max_pages {
            crawl.max_pages = pages;
        }
        if let Some(limit) = self.crawl.page_failure_limit {
            crawl.page_failure_limit = limit.max(1);
        }

        let schedule = &mut settings.schedule;
        if let Some(workers) = self.schedule.workers {
            schedule.workers = (workers as usize).max(1);
        }
        if let Some(secs) = self.schedule.video_idle {
            schedule.video_idle = std::time::Duration::from_secs(secs);
        }
        if let Some(secs) = self.schedule.product_idle {
            schedule.product_idle = std::time::Duration::from_secs(secs);
        }
        if let Some(secs) = self.schedule.error_delay {
            schedule.error_delay = std::time::Duration::from_secs(secs);
        }
        if let Some(batch) = self.schedule.product_batch {
            schedule.product_batch = Some(batch as i64);
        }

        let lifecycle = &mut settings.lifecycle;
        if let Some(limit) = self.lifecycle.no_posts_limit {
            lifecycle.no_posts_limit = limit as i32;
        }
        if let Some(limit) = self.lifecycle.no_shop_limit {
            lifecycle.no_shop_limit = limit as i32;
        }
        if let Some(ratio) = self.lifecycle.min_shop_ratio {
            lifecycle.min_shop_ratio = ratio;
        }
        if let Some(min) = self.lifecycle.ratio_min_videos {
            lifecycle.ratio_min_videos = min as i64;
        }
        if let Some(window) = self.lifecycle.recent_window_hours.and_then(recent_window) {
            lifecycle.recent_window = window;
        }
    }
}

fn recent_window(hours: u64) -> Option<chrono::Duration> {
    i64::try_from(hours).ok().and_then(chrono::Duration::try_hours)
}

fn set_string(target: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
        *target = value.clone();
    }
}
