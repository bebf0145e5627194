//! Application error handling
//!
//! This module converts internal errors to HTTP responses. Bodies follow the
//! front-end's contract: `{ "msg": ... }` for single failures and
//! `{ "errors": [{ "msg": ... }] }` for rejected input. Server faults are
//! logged in full and reported to the client only as "Server error".

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use devconnector_shared::{ErrorsResponse, MessageResponse};
use thiserror::Error;
use tracing::error;

/// Client-facing body for every 5xx
pub const SERVER_ERROR_MSG: &str = "Server error";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0:?}")]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// Single-message validation failure
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(vec![msg.into()])
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Validation(messages) => {
                let body = ErrorsResponse {
                    errors: messages.into_iter().map(MessageResponse::new).collect(),
                };
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MSG.to_string())
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MSG.to_string())
            }
        };

        (status, Json(MessageResponse::new(msg))).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
