use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path as AxumPath, RawQuery, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use crate::engine::App;
use crate::errors::WikiError;
use crate::types::Request;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

/// Every path and method goes through the middleware chain
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", any(handle_root))
        .route("/*path", any(handle_path))
        .with_state(AppState { app })
}

/// Handle root path requests
pub async fn handle_root(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, WikiError> {
    dispatch(state, Request::new(method, "/", query, body)).await
}

/// Handle path requests
pub async fn handle_path(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, WikiError> {
    dispatch(state, Request::new(method, format!("/{}", path), query, body)).await
}

/// Page and asset I/O is blocking, so the chain runs off the async workers
async fn dispatch(state: AppState, request: Request) -> Result<Response, WikiError> {
    let app = Arc::clone(&state.app);
    let committed = tokio::task::spawn_blocking(move || app.dispatch(request))
        .await
        .map_err(|e| WikiError::Internal(format!("request task failed: {}", e)))?;
    Ok(committed.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn wiki(dir: &TempDir) -> Router {
        router(Arc::new(build_app(&Config::with_data_dir(dir.path()))))
    }

    #[tokio::test]
    async fn missing_page_redirects() {
        let dir = TempDir::new().unwrap();
        let resp = wiki(&dir)
            .oneshot(HttpRequest::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "?do=update");
    }

    #[tokio::test]
    async fn post_saves_through_the_router() {
        let dir = TempDir::new().unwrap();
        let request = HttpRequest::post("/my%20notes?do=update")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("content=Hello"))
            .unwrap();
        let resp = wiki(&dir).oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Content saved"));
        assert_eq!(std::fs::read_to_string(dir.path().join("my notes.md")).unwrap(), "Hello");
    }

    #[tokio::test]
    async fn serves_bundled_stylesheet() {
        let dir = TempDir::new().unwrap();
        let resp = wiki(&dir)
            .oneshot(HttpRequest::get("/css/wiki.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    }
}
