use std::io;
use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

/// Custom error types for the wiki application
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not found")]
    NotFound,
    #[error("Invalid path")]
    InvalidPath,
    #[error("Template error: {0}")]
    TemplateError(String),
    #[error("Asset not found: {0}")]
    AssetNotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WikiError {
    /// Build a template error for `template` with the given detail
    pub fn template(template: &str, detail: impl std::fmt::Display) -> Self {
        WikiError::TemplateError(format!("{}: {}", template, detail))
    }
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        match self {
            WikiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            WikiError::InvalidPath => (StatusCode::BAD_REQUEST, "Invalid path").into_response(),
            other => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", other)).into_response(),
        }
    }
}
