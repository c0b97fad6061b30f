//! Configuration loading and environment overrides.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::rate_limit::RateLimitConfig;
use crate::repository::util::redact_url_password;

use super::{Config, Settings};

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Database file path or URL (--database flag).
    pub database: Option<String>,
}

/// Load config from the explicit path or via discovery.
async fn load_file_config(options: &LoadOptions) -> Config {
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Config::default()
            }
        };
    }
    Config::load().await
}

/// Apply environment variable overrides. `lookup` returns a variable's value.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = var("SHOPCRAWL_API_KEY") {
        settings.upstream.api_key = key;
    }
    if let Some(host) = var("SHOPCRAWL_API_HOST") {
        settings.upstream.api_host = host;
    }
    if let Some(base_url) = var("SHOPCRAWL_API_BASE_URL") {
        settings.upstream.base_url = base_url;
    }
    if let Some(region) = var("SHOPCRAWL_REGION") {
        settings.upstream.region = region;
    }
    if let Some(hashtags) = var("SHOPCRAWL_HASHTAGS") {
        settings.hashtags = hashtags
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
    }
    if let Some(rps) = var("SHOPCRAWL_TARGET_RPS") {
        match rps.trim().parse::<f64>() {
            Ok(value) if RateLimitConfig::is_valid_rps(value) => {
                settings.rate_limit.target_rps = value
            }
            _ => warn!("Ignoring invalid SHOPCRAWL_TARGET_RPS={}", rps),
        }
    }
    if let Some(database_url) = var("DATABASE_URL") {
        debug!(
            "Using DATABASE_URL from environment: {}",
            redact_url_password(&database_url)
        );
        settings.database_url = Some(database_url);
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;
    let mut settings = Settings::default();

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    // --database takes precedence over everything else
    if let Some(database) = options.database {
        if database.contains("://") || database.starts_with("sqlite:") {
            settings.database_url = Some(database);
        } else {
            let path = config.resolve_path(
                &database,
                &std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            );
            settings.database_url = Some(format!("sqlite:{}", path.display()));
        }
    }

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_overrides_apply() {
        let mut settings = Settings::with_data_dir(PathBuf::from("/tmp"));
        apply_env_overrides(
            &mut settings,
            env(&[
                ("SHOPCRAWL_API_KEY", "k"),
                ("SHOPCRAWL_REGION", "FR"),
                ("SHOPCRAWL_HASHTAGS", "deals, ,gadgets"),
                ("SHOPCRAWL_TARGET_RPS", "2"),
                ("DATABASE_URL", "sqlite:/data/x.db"),
            ]),
        );

        assert_eq!(settings.upstream.api_key, "k");
        assert_eq!(settings.upstream.region, "FR");
        assert_eq!(settings.hashtags, vec!["deals", "gadgets"]);
        assert_eq!(settings.rate_limit.target_rps, 2.0);
        assert_eq!(settings.database_url(), "sqlite:/data/x.db");
    }

    #[test]
    fn invalid_and_empty_values_are_ignored() {
        let mut settings = Settings::with_data_dir(PathBuf::from("/tmp"));
        apply_env_overrides(
            &mut settings,
            env(&[("SHOPCRAWL_TARGET_RPS", "fast"), ("SHOPCRAWL_API_KEY", "  ")]),
        );
        assert_eq!(settings.rate_limit.target_rps, 5.0);
        assert!(settings.upstream.api_key.is_empty());

        apply_env_overrides(&mut settings, env(&[("SHOPCRAWL_TARGET_RPS", "1e-30")]));
        assert_eq!(settings.rate_limit.target_rps, 5.0);
    }
}
