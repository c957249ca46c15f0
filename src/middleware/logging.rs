use log::info;

use crate::engine::{Middleware, MiddlewareResult, Next};
use crate::types::Context;

/// Logs `METHOD URI` for every request, then continues
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> MiddlewareResult {
        info!("{} {}", ctx.request.method, ctx.request.uri());
        next.run(ctx)
    }
}
