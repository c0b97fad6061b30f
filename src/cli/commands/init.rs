//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::util::redact_url_password;

use super::open_repositories;

/// Create the data directory and database schema.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;

    let handles = repos.handles.usernames().await?.len();
    println!(
        "{} Initialized shopcrawl database at {}",
        style("✓").green(),
        redact_url_password(&settings.database_url())
    );
    if handles == 0 && settings.hashtags.is_empty() {
        println!(
            "{} No hashtags configured and no handles tracked",
            style("!").yellow()
        );
        println!("  Set SHOPCRAWL_HASHTAGS or run `shopcrawl handles add <username>`");
    }

    Ok(())
}
