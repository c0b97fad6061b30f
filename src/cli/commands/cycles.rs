//! Long-running `videos` and `products` commands.

use std::time::Duration;

use tracing::info;

use crate::config::Settings;
use crate::crawl::Paginator;
use crate::enrich::Enricher;
use crate::lifecycle::LifecycleManager;
use crate::repository::util::redact_url_password;
use crate::runner::{run_forever, Cycle, EnrichmentCycle, VideoCycle};
use crate::shutdown::Shutdown;

use super::open_repositories;

async fn drive<C: Cycle>(
    cycle: &C,
    settings: &Settings,
    idle: Duration,
    once: bool,
) -> anyhow::Result<()> {
    let (trigger, shutdown) = Shutdown::channel();
    Shutdown::listen_for_ctrl_c(trigger);

    if once {
        let summary = cycle.run_once(&shutdown).await?;
        info!("[{}] {}", cycle.name(), summary);
        info!("[{}] Upstream: {}", cycle.name(), cycle.fetch_stats());
        return Ok(());
    }

    run_forever(cycle, idle, settings.schedule.error_delay, &shutdown).await;
    Ok(())
}

/// Discovery cycle over hashtags and active handles.
pub async fn cmd_videos(settings: &Settings, once: bool) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let api = settings.upstream_api()?;

    info!(
        "Starting video discovery ({} hashtags, {} rps, database {})",
        settings.hashtags.len(),
        settings.rate_limit.target_rps,
        redact_url_password(&settings.database_url())
    );

    let paginator = Paginator::new(api, repos.clone(), settings.crawl.clone());
    let lifecycle = LifecycleManager::new(repos.clone(), settings.lifecycle.clone());
    let cycle = VideoCycle::new(
        paginator,
        lifecycle,
        repos,
        settings.hashtags.clone(),
        settings.schedule.workers,
    );

    drive(&cycle, settings, settings.schedule.video_idle, once).await
}

/// Enrichment cycle over products still missing display fields.
pub async fn cmd_products(settings: &Settings, once: bool) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let api = settings.upstream_api()?;

    info!(
        "Starting product enrichment ({} workers, {} rps)",
        settings.schedule.workers, settings.rate_limit.target_rps
    );

    let enricher = Enricher::new(api, repos.clone());
    let cycle = EnrichmentCycle::new(
        enricher,
        repos,
        settings.schedule.workers,
        settings.schedule.product_batch,
    );

    drive(&cycle, settings, settings.schedule.product_idle, once).await
}
