//! The content pipeline: list, read, edit, save and delete pages.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use log::{debug, info};

use crate::engine::{Flow, Middleware, MiddlewareResult, Next};
use crate::errors::WikiError;
use crate::services::{MarkdownRenderer, PageStore};
use crate::templates::{Data, Renderer, Value, SAVED_MESSAGE};
use crate::types::{Action, Context};

/// Path that lists every page
pub const LISTING_PATH: &str = "/index";

/// Where a missing page sends the reader
const EDIT_LOCATION: &str = "?do=update";

/// Terminal middleware serving wiki pages from a [`PageStore`]
pub struct Pages {
    store: PageStore,
    renderer: Renderer,
    markdown: Arc<dyn MarkdownRenderer>,
}

impl Pages {
    pub fn new(store: PageStore, renderer: Renderer, markdown: Arc<dyn MarkdownRenderer>) -> Self {
        Self { store, renderer, markdown }
    }

    fn list(&self, ctx: &mut Context) -> MiddlewareResult {
        let files = self.store.list()?;
        let data = Data::new().with("files", files);
        self.respond(ctx, "index", &data)
    }

    fn show(&self, ctx: &mut Context) -> MiddlewareResult {
        let raw = match self.store.read(&ctx.request.path) {
            Ok(raw) => raw,
            Err(WikiError::NotFound) => {
                debug!("No page at {}, redirecting to editor", ctx.request.path);
                return ctx.redirect(EDIT_LOCATION);
            }
            Err(e) => return Err(e),
        };
        let html = String::from_utf8_lossy(&self.markdown.convert(&raw)).into_owned();
        let data = Data::new().with("content", Value::Html(html));
        self.respond(ctx, "read", &data)
    }

    fn edit_form(&self, ctx: &mut Context) -> MiddlewareResult {
        let content = match self.store.read(&ctx.request.path) {
            Ok(raw) => String::from_utf8_lossy(&raw).into_owned(),
            Err(e) => {
                debug!("Opening empty editor for {}: {}", ctx.request.path, e);
                String::new()
            }
        };
        self.respond(ctx, "update", &Data::new().with("content", content))
    }

    fn save(&self, ctx: &mut Context) -> MiddlewareResult {
        let content = ctx
            .request
            .form()
            .into_iter()
            .find(|(key, _)| key == "content")
            .map(|(_, value)| value)
            .unwrap_or_default();

        self.store.write(&ctx.request.path, content.as_bytes())?;
        ctx.success = Some(SAVED_MESSAGE.to_string());
        self.respond(ctx, "update", &Data::new().with("content", content))
    }

    fn delete(&self, ctx: &mut Context) -> MiddlewareResult {
        self.store.delete(&ctx.request.path)?;
        info!("Page {} removed", ctx.request.path);
        ctx.redirect(LISTING_PATH)
    }

    fn respond(&self, ctx: &mut Context, template: &str, data: &Data) -> MiddlewareResult {
        let page = self.renderer.render(ctx, template, data)?;
        ctx.response
            .set_header(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        ctx.response.body = Some(page.into_bytes());
        Ok(Flow::Continue)
    }
}

impl Middleware for Pages {
    fn handle(&self, ctx: &mut Context, _next: Next<'_>) -> MiddlewareResult {
        if ctx.request.path == LISTING_PATH {
            return self.list(ctx);
        }
        match ctx.action() {
            Action::Read => self.show(ctx),
            Action::Update if ctx.request.method == Method::POST => self.save(ctx),
            Action::Update => self.edit_form(ctx),
            Action::Delete => self.delete(ctx),
        }
    }
}
