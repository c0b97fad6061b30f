//! Data models for shopcrawl.

mod handle;
mod history;
mod product;
mod video;

pub use handle::{DiscoverySource, Handle, HandleStatus};
pub use history::ScrapeHistoryEntry;
pub use product::ProductMetadata;
pub use video::{ProductFields, VideoRecord};
