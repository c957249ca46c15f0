//! Ordered middleware chain with continuation-passing control flow.
//!
//! Every middleware receives the request [`Context`] and a [`Next`]
//! continuation for the rest of the chain. It either calls `next.run(ctx)`
//! or ends the chain itself, and reports how it ended through [`Flow`]:
//!
//! - [`Flow::Continue`]: normal completion, the engine commits the response.
//! - [`Flow::ShortCircuit`]: the final response (e.g. a redirect) is already
//!   set up; remaining middlewares are skipped and nothing is logged.
//! - [`Flow::Delegated`]: the middleware wrote to the transport itself; the
//!   engine must not write anything else.
//!
//! An `Err` is an unexpected failure and becomes a plain-text 500.

use axum::http::{header, HeaderValue, StatusCode};
use log::{debug, error};

use crate::errors::WikiError;
use crate::types::{Committed, Context, Request};

/// How a middleware (or the rest of the chain) finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    ShortCircuit,
    Delegated,
}

pub type MiddlewareResult = Result<Flow, WikiError>;

/// One step of the request pipeline
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> MiddlewareResult;
}

impl<F> Middleware for F
where
    F: Fn(&mut Context, Next<'_>) -> MiddlewareResult + Send + Sync,
{
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> MiddlewareResult {
        self(ctx, next)
    }
}

/// The remainder of the chain. Consumed on use, so it runs at most once.
pub struct Next<'a> {
    chain: &'a [Box<dyn Middleware>],
}

impl<'a> Next<'a> {
    fn new(chain: &'a [Box<dyn Middleware>]) -> Self {
        Self { chain }
    }

    pub fn run(self, ctx: &mut Context) -> MiddlewareResult {
        match self.chain.split_first() {
            Some((first, rest)) => first.handle(ctx, Next::new(rest)),
            None => Ok(Flow::Continue),
        }
    }
}

/// The middleware engine. Built once at startup, read-only while serving.
#[derive(Default)]
pub struct App {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the end of the chain
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Append a closure middleware
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context, Next<'_>) -> MiddlewareResult + Send + Sync + 'static,
    {
        self.use_middleware(f)
    }

    /// Run the whole chain for `ctx` and commit its response.
    ///
    /// The transport is written exactly once: by the engine here, or by
    /// the middleware that returned [`Flow::Delegated`].
    pub fn run(&self, ctx: &mut Context) {
        match Next::new(&self.middlewares).run(ctx) {
            Ok(Flow::Delegated) => {
                debug!("Response for {} written by middleware", ctx.request.path);
                return;
            }
            Ok(Flow::Continue) | Ok(Flow::ShortCircuit) => {}
            Err(err) => {
                error!("Caught error: {}", err);
                ctx.response.status = StatusCode::INTERNAL_SERVER_ERROR;
                ctx.response.body = Some(format!("{}\n", err).into_bytes());
                ctx.response.set_header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
            }
        }

        let response = &mut ctx.response;
        if response.status == StatusCode::NOT_FOUND && response.body.is_some() {
            response.status = StatusCode::OK;
        }
        let body = response.body.take().unwrap_or_default();
        response.transport.write(response.status, body);
    }

    /// Build a fresh context for `request`, run the chain and hand back what
    /// was committed
    pub fn dispatch(&self, request: Request) -> Committed {
        let mut ctx = Context::new(request);
        self.run(&mut ctx);
        match ctx.response.transport.take() {
            Some(committed) => committed,
            None => {
                error!("No response was written for {}", ctx.request.path);
                Committed {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    headers: Default::default(),
                    body: b"no response written\n".to_vec(),
                }
            }
        }
    }
}
