//! Error types for clearance-web
//!
//! API routes answer with a JSON error body, page routes with an HTML error
//! page. Server-side details never reach the HTML page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use clearance_common::Error as CommonError;
use serde_json::json;
use thiserror::Error;

use crate::render;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// clearance-common error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// Unknown record id or mismatched URL segments
    pub fn record_not_found() -> Self {
        ApiError::NotFound("Record not found".to_string())
    }

    /// Status code, machine-readable code and message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone()),
            ApiError::Common(CommonError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone())
            }
            ApiError::Common(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, "MALFORMED_INPUT", err.to_string())
            }
            ApiError::Common(err) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
            }
            ApiError::Other(err) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Same failures as [`ApiError`], rendered as an HTML page
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        PageError(err)
    }
}

impl From<CommonError> for PageError {
    fn from(err: CommonError) -> Self {
        PageError(ApiError::Common(err))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, _, message) = self.0.parts();
        let message = if status.is_server_error() {
            "Something went wrong on our side.".to_string()
        } else {
            message
        };
        (status, Html(render::error_page(status, &message))).into_response()
    }
}

/// Result type for HTML page handlers
pub type PageResult<T> = Result<T, PageError>;
