//! Two-step page composition: a named template renders a [`Fragment`],
//! which the `layout` template then wraps into a full [`Page`].

pub mod engine;

use std::sync::Arc;

use log::debug;

use crate::errors::WikiError;
use crate::services::AssetSource;
use crate::types::{Action, Context};

pub use engine::{Data, FuncMap, Template, Value};

/// Template wrapped around every fragment
pub const LAYOUT: &str = "layout";

/// Title handed to the layout
pub const SITE_TITLE: &str = "Wiki";

/// Notice shown once after a successful save
pub const SAVED_MESSAGE: &str = "Content saved";

/// HTML produced by a single named template, before layout
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment(String);

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A complete document, ready to become a response body
#[derive(Debug, Clone, PartialEq)]
pub struct Page(Vec<u8>);

impl Page {
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Renders templates loaded from an [`AssetSource`]
#[derive(Clone)]
pub struct Renderer {
    assets: Arc<dyn AssetSource>,
}

impl Renderer {
    pub fn new(assets: Arc<dyn AssetSource>) -> Self {
        Self { assets }
    }

    /// Render `name` with `data` into a fragment
    pub fn fragment(&self, ctx: &Context, name: &str, data: &Data) -> Result<Fragment, WikiError> {
        let template = self.load(name)?;
        let html = template.execute(&helpers(ctx), data)?;
        Ok(Fragment(html))
    }

    /// Wrap a fragment in the layout
    pub fn compose(&self, ctx: &Context, fragment: Fragment) -> Result<Page, WikiError> {
        let data = Data::new()
            .with("title", SITE_TITLE)
            .with("main", Value::Html(fragment.into_string()));
        let layout = self.load(LAYOUT)?;
        let html = layout.execute(&helpers(ctx), &data)?;
        Ok(Page(html.into_bytes()))
    }

    /// Fragment then layout
    pub fn render(&self, ctx: &Context, name: &str, data: &Data) -> Result<Page, WikiError> {
        let fragment = self.fragment(ctx, name, data)?;
        self.compose(ctx, fragment)
    }

    fn load(&self, name: &str) -> Result<Template, WikiError> {
        let path = format!("templates/{}.html", name);
        debug!("Loading template {}", path);
        let source = self.assets.read(&path)?;
        let source = std::str::from_utf8(&source).map_err(|e| WikiError::template(name, e))?;
        Template::parse(name, source)
    }
}

/// Helpers every template can call, bound to the current request
pub fn helpers(ctx: &Context) -> FuncMap<'_> {
    FuncMap::new()
        .with("uri", move || Value::Text(ctx.request.path.clone()))
        .with("is_read", move || Value::Bool(ctx.action() == Action::Read))
        .with("is_update", move || Value::Bool(ctx.action() == Action::Update))
        .with("show_alerts", move || Value::Html(alert_html(ctx.success.as_deref())))
}

/// Dismissible notice for a stashed success message. The message is
/// internal, so it is not escaped.
fn alert_html(message: Option<&str>) -> String {
    match message {
        Some(message) => format!(
            "<div class=\"alert alert-success alert-dismissible\" role=\"alert\">\n\
             <button type=\"button\" class=\"close\" data-dismiss=\"alert\" aria-label=\"Close\">\
             <span aria-hidden=\"true\">&times;</span></button>\n{}</div>",
            message
        ),
        None => String::new(),
    }
}
