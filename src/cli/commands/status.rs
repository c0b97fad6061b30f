//! Status command.

use console::style;

use crate::config::Settings;
use crate::models::HandleStatus;

use super::open_repositories;

/// Print collection counts.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;

    let videos = repos.videos.count().await?;
    let pending = repos.videos.pending_product_ids(None).await?.len();
    let cached = repos.products.count_cached().await?;
    let blacklisted = repos.products.count_blacklisted().await?;
    let by_status = repos.handles.count_by_status().await?;

    println!("{}", style("Videos").bold());
    println!("  {:<20} {}", "stored", videos);
    println!("  {:<20} {}", "pending products", pending);
    println!("{}", style("Products").bold());
    println!("  {:<20} {}", "cached", cached);
    println!("  {:<20} {}", "blacklisted", blacklisted);
    println!("{}", style("Handles").bold());
    for status in HandleStatus::all() {
        let count = by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        println!("  {:<20} {}", status.as_str(), count);
    }

    Ok(())
}
