use std::path::Path;
use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use log::debug;

use crate::engine::{Flow, Middleware, MiddlewareResult, Next};
use crate::services::AssetSource;
use crate::types::Context;
use crate::utils::content_type_for;

/// Logical directory holding public files
pub const PUBLIC_DIR: &str = "www";

/// Serves public assets; passes every other request down the chain
pub struct StaticAssets {
    assets: Arc<dyn AssetSource>,
}

impl StaticAssets {
    pub fn new(assets: Arc<dyn AssetSource>) -> Self {
        Self { assets }
    }
}

impl Middleware for StaticAssets {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> MiddlewareResult {
        let logical = format!("{}{}", PUBLIC_DIR, ctx.request.path);
        if !self.assets.exists(&logical) {
            return next.run(ctx);
        }

        if let Some(content_type) = content_type_for(Path::new(&logical)) {
            ctx.response.set_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        let bytes = self.assets.read(&logical)?.into_owned();
        debug!("Serving asset {} ({} bytes)", logical, bytes.len());

        if self.assets.delegates_writes() {
            ctx.response.transport.write(StatusCode::OK, bytes);
            return Ok(Flow::Delegated);
        }
        ctx.response.body = Some(bytes);
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::App;
    use crate::services::{DiskAssets, EmbeddedAssets};
    use crate::types::{Committed, Request};
    use std::fs;
    use tempfile::TempDir;

    fn app_with(assets: Arc<dyn AssetSource>) -> App {
        let mut app = App::new();
        app.use_middleware(StaticAssets::new(assets));
        app.use_fn(|ctx, _next| {
            ctx.response.body = Some(b"fallthrough".to_vec());
            Ok(Flow::Continue)
        });
        app
    }

    fn disk_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("www/css")).unwrap();
        fs::write(dir.path().join("www/css/wiki.css"), "body { margin: 0; }").unwrap();
        fs::write(dir.path().join("www/blob.xyz"), "???").unwrap();
        dir
    }

    fn assert_served(committed: &Committed) {
        assert_eq!(committed.status, StatusCode::OK);
        assert_eq!(committed.header(header::CONTENT_TYPE), Some("text/css; charset=utf-8"));
    }

    #[test]
    fn embedded_asset_is_served() {
        let app = app_with(Arc::new(EmbeddedAssets::new()));
        let committed = app.dispatch(Request::get("/css/wiki.css", None));
        assert_served(&committed);
        assert!(committed.text().contains(".topbar"));
    }

    #[test]
    fn disk_asset_is_delegated() {
        let dir = disk_root();
        let app = app_with(Arc::new(DiskAssets::new(dir.path())));

        let mut ctx = Context::new(Request::get("/css/wiki.css", None));
        app.run(&mut ctx);
        assert_eq!(ctx.response.transport.writes(), 1);
        let committed = ctx.response.transport.take().unwrap();
        assert_served(&committed);
        assert_eq!(committed.text(), "body { margin: 0; }");
    }

    #[test]
    fn unknown_extension_gets_no_content_type() {
        let dir = disk_root();
        let app = app_with(Arc::new(DiskAssets::new(dir.path())));
        let committed = app.dispatch(Request::get("/blob.xyz", None));
        assert_eq!(committed.text(), "???");
        assert!(committed.header(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn directories_and_misses_pass_through() {
        let dir = disk_root();
        let app = app_with(Arc::new(DiskAssets::new(dir.path())));
        for path in ["/css", "/", "/nothing.css", "/notes"] {
            assert_eq!(app.dispatch(Request::get(path, None)).text(), "fallthrough", "{}", path);
        }
        let app = app_with(Arc::new(EmbeddedAssets::new()));
        for path in ["/css", "/", "/notes"] {
            assert_eq!(app.dispatch(Request::get(path, None)).text(), "fallthrough", "{}", path);
        }
    }
}
