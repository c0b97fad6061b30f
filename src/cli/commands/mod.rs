//! Command implementations.

pub mod cycles;
pub mod handles;
pub mod init;
pub mod status;

use anyhow::Context;

use crate::config::Settings;
use crate::repository::util::redact_url_password;
use crate::repository::Repositories;

/// Open the configured store with its schema in place.
pub(crate) async fn open_repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    settings.ensure_directories()?;
    let url = settings.database_url();
    let ctx = settings
        .create_db_context()
        .with_context(|| format!("failed to open database {}", redact_url_password(&url)))?;
    ctx.init_schema()
        .await
        .with_context(|| format!("failed to prepare schema in {}", redact_url_password(&url)))?;
    Ok(Repositories::new(&ctx))
}
