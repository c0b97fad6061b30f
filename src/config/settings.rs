//! Resolved runtime settings.

use std::path::PathBuf;

use crate::crawl::CrawlConfig;
use crate::lifecycle::LifecyclePolicy;
use crate::rate_limit::{RateLimitConfig, RetryPolicy};
use crate::repository::util::is_postgres_url;
use crate::repository::{DbContext, DieselError};
use crate::runner::ScheduleConfig;
use crate::upstream::{UpstreamApi, UpstreamConfig};

use super::{ConfigError, DEFAULT_DATABASE_FILENAME};

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside `data_dir`.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Hashtags crawled every discovery cycle.
    pub hashtags: Vec<String>,
    pub upstream: UpstreamConfig,
    pub rate_limit: RateLimitConfig,
    pub listing_retry: RetryPolicy,
    pub product_retry: RetryPolicy,
    pub crawl: CrawlConfig,
    pub schedule: ScheduleConfig,
    pub lifecycle: LifecyclePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shopcrawl");
        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            hashtags: Vec::new(),
            upstream: UpstreamConfig::default(),
            rate_limit: RateLimitConfig::default(),
            listing_retry: RetryPolicy::listing(),
            product_retry: RetryPolicy::product(),
            crawl: CrawlConfig::default(),
            schedule: ScheduleConfig::default(),
            lifecycle: LifecyclePolicy::default(),
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    pub fn is_postgres(&self) -> bool {
        self.database_url
            .as_ref()
            .is_some_and(|url| is_postgres_url(url))
    }

    /// Create the data directory when using the default SQLite file.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if self.database_url.is_none() {
            std::fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }

    pub fn create_db_context(&self) -> Result<DbContext, DieselError> {
        DbContext::from_url(&self.database_url())
    }

    /// Upstream client with this configuration's pacing and retry budgets.
    pub fn upstream_api(&self) -> Result<UpstreamApi, ConfigError> {
        self.upstream.validate()?;
        let api = UpstreamApi::connect(self.upstream.clone(), self.rate_limit.clone())?;
        Ok(api.with_policies(self.listing_retry.clone(), self.product_retry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_defaults_to_sqlite_file() {
        let settings = Settings::with_data_dir(PathBuf::from("/var/lib/shopcrawl"));
        assert_eq!(settings.database_url(), "sqlite:/var/lib/shopcrawl/shopcrawl.db");
        assert!(!settings.is_postgres());
    }

    #[test]
    fn test_upstream_api_requires_key() {
        let mut settings = Settings::with_data_dir(PathBuf::from("/tmp"));
        assert!(matches!(settings.upstream_api(), Err(ConfigError::MissingValue(_))));

        settings.upstream.api_key = "secret".to_string();
        assert!(settings.upstream_api().is_ok());
    }
}
