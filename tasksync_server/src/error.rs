//! HTTP-facing error taxonomy.
//!
//! Every variant renders as a status code plus a `{"detail": ...}` body, the
//! shape clients parse for user-visible messages. Database failures are
//! logged server-side and surfaced as an opaque 500.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed payload. Renders as 422 with the field-level detail, which
    /// clients treat as non-retryable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Request is well-formed but unacceptable, e.g. registering an email
    /// that already exists. Renders as 400.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed or expired bearer credential. Renders as 401.
    #[error("{0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// Token signing failed. Renders as an opaque 500.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Validation(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail.clone()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            ApiError::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, detail.clone()),
            ApiError::Db(err) => {
                log::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ApiError::Token(err) => {
                log::error!("token signing error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
