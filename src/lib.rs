//! Flatwiki - a personal wiki of markdown files
//!
//! Requests run through a small middleware engine: request logging, static
//! assets, then the page pipeline, which reads, edits, saves, deletes and
//! lists flat markdown files and renders them through layout templates.

pub mod app;
pub mod config;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod middleware;
pub mod services;
pub mod templates;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use app::build_app;
pub use config::Config;
pub use engine::{App, Flow, Middleware, MiddlewareResult, Next};
pub use errors::WikiError;
pub use handlers::router;
pub use types::{Action, Committed, Context, Request};
