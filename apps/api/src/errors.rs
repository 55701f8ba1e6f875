use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::render::RenderError;

/// Body returned for every failed request. Causes are logged, never sent.
pub const GENERIC_FAILURE_BODY: &str = "Something went wrong";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers and extractors can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected by the upload layer: bad multipart body, disallowed type, oversize file.
    #[error("Upload rejected: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upload(msg) => tracing::warn!("Upload rejected: {msg}"),
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Render(e) => tracing::error!("Render error: {e}"),
            AppError::Io(e) => tracing::error!("I/O error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
        }

        // Every failure class collapses to the same response.
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            GENERIC_FAILURE_BODY,
        )
            .into_response()
    }
}
