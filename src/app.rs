use std::sync::Arc;

use log::info;

use crate::config::Config;
use crate::engine::App;
use crate::middleware::{Pages, RequestLogger, StaticAssets};
use crate::services::{AssetSource, DiskAssets, EmbeddedAssets, MarkdownService, PageStore};
use crate::templates::Renderer;

/// Pick the asset source once for the lifetime of the process
pub fn asset_source(config: &Config) -> Arc<dyn AssetSource> {
    if config.debug {
        info!("Debug mode: reading assets from {:?}", config.asset_dir);
        Arc::new(DiskAssets::new(&config.asset_dir))
    } else {
        Arc::new(EmbeddedAssets::new())
    }
}

/// Assemble the wiki: request logging, static assets, then pages
pub fn build_app(config: &Config) -> App {
    let assets = asset_source(config);
    let renderer = Renderer::new(Arc::clone(&assets));
    let pages = Pages::new(
        PageStore::new(&config.data_dir),
        renderer,
        Arc::new(MarkdownService::new()),
    );

    let mut app = App::new();
    app.use_middleware(RequestLogger)
        .use_middleware(StaticAssets::new(assets))
        .use_middleware(pages);
    app
}
