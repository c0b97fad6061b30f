//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking.
//! Supports both SQLite and PostgreSQL backends.

pub mod context;
pub mod handle;
pub mod history;
pub mod models;
pub mod pool;
pub mod product;
pub mod raw_page;
pub mod util;
pub mod video;

pub use context::DbContext;
pub use handle::HandleRepository;
pub use history::ScrapeHistoryRepository;
pub use pool::{DbPool, DieselError};
pub use product::ProductRepository;
pub use raw_page::RawPageRepository;
pub use video::VideoRepository;

/// All repositories sharing one pool.
#[derive(Clone)]
pub struct Repositories {
    pub videos: VideoRepository,
    pub products: ProductRepository,
    pub handles: HandleRepository,
    pub history: ScrapeHistoryRepository,
    pub raw_pages: RawPageRepository,
    pool: DbPool,
}

impl Repositories {
    pub fn new(ctx: &DbContext) -> Self {
        Self {
            videos: ctx.videos(),
            products: ctx.products(),
            handles: ctx.handles(),
            history: ctx.history(),
            raw_pages: ctx.raw_pages(),
            pool: ctx.pool().clone(),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::{DbContext, DbPool, Repositories};

    /// Fresh SQLite database in a temporary directory with the schema applied.
    pub async fn setup_test_db() -> (Repositories, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = DbContext::new(DbPool::sqlite_from_path(&dir.path().join("test.db")));
        ctx.init_schema().await.unwrap();
        (Repositories::new(&ctx), dir)
    }
}
