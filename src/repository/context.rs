//! Database context for managing connections and repository access.

use diesel_async::SimpleAsyncConnection;

use super::handle::HandleRepository;
use super::history::ScrapeHistoryRepository;
use super::pool::{DbPool, DieselError};
use super::product::ProductRepository;
use super::raw_page::RawPageRepository;
use super::video::VideoRepository;

/// Owns the connection pool and hands out repositories.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:/var/lib/shopcrawl/shopcrawl.db")?;
/// ctx.init_schema().await?;
/// let pending = ctx.videos().pending_product_ids(None).await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a context from a database URL or SQLite path.
    pub fn from_url(url: &str) -> Result<Self, DieselError> {
        Ok(Self::new(DbPool::from_url(url)?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn videos(&self) -> VideoRepository {
        VideoRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn handles(&self) -> HandleRepository {
        HandleRepository::new(self.pool.clone())
    }

    pub fn history(&self) -> ScrapeHistoryRepository {
        ScrapeHistoryRepository::new(self.pool.clone())
    }

    pub fn raw_pages(&self) -> RawPageRepository {
        RawPageRepository::new(self.pool.clone())
    }

    /// Create any missing tables and indexes.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        crate::with_conn_split!(self.pool,
            sqlite: conn => {
                conn.batch_execute(include_str!("schema_sqlite.sql")).await
            },
            postgres: conn => {
                init_postgres_schema(&mut conn).await
            }
        )
    }
}

/// PostgreSQL needs statements executed one at a time.
#[cfg(feature = "postgres")]
async fn init_postgres_schema(
    conn: &mut diesel_async::AsyncPgConnection,
) -> Result<(), DieselError> {
    use diesel_async::RunQueryDsl;

    let script: String = include_str!("schema_postgres.sql")
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    for stmt in script.split(';') {
        let stmt = stmt.trim();
        if !stmt.is_empty() {
            diesel::sql_query(stmt).execute(conn).await?;
        }
    }
    Ok(())
}
