pub mod asset_service;
pub mod markdown_service;
pub mod page_store;

pub use asset_service::{AssetSource, DiskAssets, EmbeddedAssets};
pub use markdown_service::{MarkdownRenderer, MarkdownService};
pub use page_store::PageStore;
