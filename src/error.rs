//! Typed errors and HTTP mapping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::CONTENT_TYPE_JSON;

#[derive(Error, Debug)]
pub enum AppError {
    /// A required query or path argument was absent with no default.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    /// Malformed client input: non-integer id, bad `_filters` JSON, non-object body.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A suffixed filter referenced a column the resource does not declare.
    /// Route-setup mistake, not user input; surfaced as a server error.
    #[error("unknown column in filter: {column}")]
    UnknownColumn { column: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    /// The upstream behind a proxied route failed or answered non-success.
    #[error("upstream: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::MissingArgument(_) => (StatusCode::BAD_REQUEST, "missing_argument"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::UnknownColumn { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
        };
        let body = serde_json::to_string(&ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        })
        .unwrap_or_else(|_| String::from("{\"error\":{\"code\":\"internal\"}}"));
        (status, [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)], body).into_response()
    }
}
