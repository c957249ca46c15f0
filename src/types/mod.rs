//! Per-request state shared by every middleware of one dispatch.

use std::mem;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use log::warn;

use crate::engine::{Flow, MiddlewareResult};
use crate::errors::WikiError;

/// Query parameter selecting the page action
pub const ACTION_PARAM: &str = "do";

/// What the request asks to do with the page at its path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl Action {
    fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("update") => Action::Update,
            Some("delete") => Action::Delete,
            _ => Action::Read,
        }
    }
}

/// An inbound request, immutable once received
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub raw_query: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, raw_query: Option<String>, body: Bytes) -> Self {
        // Malformed query strings are treated as carrying no parameters.
        let query = raw_query
            .as_deref()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();
        Self { method, path: path.into(), raw_query, query, body }
    }

    /// Shorthand for a bodiless GET
    pub fn get(path: &str, raw_query: Option<&str>) -> Self {
        Self::new(Method::GET, path, raw_query.map(str::to_string), Bytes::new())
    }

    /// First value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Path plus query string, as it appeared on the request line
    pub fn uri(&self) -> String {
        match &self.raw_query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.clone(),
        }
    }

    pub fn action(&self) -> Action {
        Action::from_param(self.query_param(ACTION_PARAM).filter(|v| !v.is_empty()))
    }

    /// Decode the body as an urlencoded form, as leniently as the query
    pub fn form(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_bytes(&self.body).unwrap_or_default()
    }
}

/// Status, headers and body as finally handed to the client
#[derive(Debug, Clone)]
pub struct Committed {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Committed {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl IntoResponse for Committed {
    fn into_response(self) -> axum::response::Response {
        let mut resp = axum::response::Response::new(Body::from(self.body));
        *resp.status_mut() = self.status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

/// The connection-facing writer. Collects headers until the single write.
#[derive(Debug, Default)]
pub struct Transport {
    headers: HeaderMap,
    committed: Option<Committed>,
    writes: usize,
}

impl Transport {
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Commit status line, pending headers and body
    pub fn write(&mut self, status: StatusCode, body: Vec<u8>) {
        self.writes += 1;
        if self.committed.is_some() {
            warn!("Response already committed, dropping write with status {}", status);
            return;
        }
        let headers = mem::take(&mut self.headers);
        self.committed = Some(Committed { status, headers, body });
    }

    /// Number of write attempts seen so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn take(&mut self) -> Option<Committed> {
        self.committed.take()
    }
}

/// In-memory response mutated by middlewares before the final commit
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: Option<Vec<u8>>,
    pub transport: Transport,
}

impl Default for Response {
    fn default() -> Self {
        Self { status: StatusCode::NOT_FOUND, body: None, transport: Transport::default() }
    }
}

impl Response {
    pub fn set_header(&mut self, name: header::HeaderName, value: HeaderValue) {
        self.transport.headers_mut().insert(name, value);
    }
}

/// One request paired with its response, plus the one-shot success notice
#[derive(Debug)]
pub struct Context {
    pub request: Request,
    pub response: Response,
    pub success: Option<String>,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self { request, response: Response::default(), success: None }
    }

    pub fn action(&self) -> Action {
        self.request.action()
    }

    /// Answer with a 302 to `location` and stop the chain
    pub fn redirect(&mut self, location: &str) -> MiddlewareResult {
        let value = HeaderValue::from_str(location).map_err(|_| WikiError::InvalidPath)?;
        self.response.status = StatusCode::FOUND;
        self.response.set_header(header::LOCATION, value);
        Ok(Flow::ShortCircuit)
    }
}
