pub mod logging;
pub mod pages;
pub mod static_assets;

pub use logging::RequestLogger;
pub use pages::{Pages, LISTING_PATH};
pub use static_assets::StaticAssets;
