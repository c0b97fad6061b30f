//! Handle seeding and listing commands.

use console::style;

use crate::config::Settings;
use crate::models::{DiscoverySource, Handle, HandleStatus};

use super::open_repositories;

/// Start tracking the given usernames.
pub async fn cmd_handles_add(
    settings: &Settings,
    usernames: &[String],
    source: DiscoverySource,
) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;

    for raw in usernames {
        let username = raw.trim().trim_start_matches('@');
        if username.is_empty() {
            continue;
        }
        let handle = Handle::new(username, source);
        if repos.handles.insert_if_absent(&handle).await? {
            println!("  {} Tracking @{}", style("✓").green(), username);
        } else {
            println!("  {} @{} is already tracked", style("-").dim(), username);
        }
    }

    Ok(())
}

/// List tracked handles.
pub async fn cmd_handles_list(
    settings: &Settings,
    status: Option<HandleStatus>,
) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let handles = repos.handles.list(status).await?;

    if handles.is_empty() {
        println!("{} No handles tracked", style("!").yellow());
        return Ok(());
    }

    println!(
        "{:<28} {:<9} {:<8} {:>7} {:>6} {:>6}  {}",
        "HANDLE", "STATUS", "SOURCE", "VIDEOS", "SHOP", "RATIO", "LAST SCRAPED"
    );
    for handle in handles {
        let last = handle
            .last_scraped
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<28} {:<9} {:<8} {:>7} {:>6} {:>5.1}%  {}",
            format!("@{}", handle.username),
            handle.status.as_str(),
            handle.discovery_source.as_str(),
            handle.total_videos,
            handle.shop_videos,
            handle.shop_ratio() * 100.0,
            last
        );
    }

    Ok(())
}
