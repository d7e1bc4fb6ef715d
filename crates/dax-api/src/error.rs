//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across the
//! HTTP endpoints and a matching `extensions.code` on GraphQL errors.

use async_graphql::ErrorExtensions;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use dax_core::error::DaxError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes, JSON responses and
/// GraphQL error extensions.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 Bad Request - invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// 401 Unauthorized - missing token or wrong credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// 404 Not Found - resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// 409 Conflict - unique constraint violated.
    #[error("{0}")]
    Conflict(String),
    /// 500 Internal Server Error - unexpected server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code reported in GraphQL `extensions.code`.
    pub fn graphql_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_USER_INPUT",
            ApiError::Unauthorized(_) => "UNAUTHENTICATED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    fn http_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.http_code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.graphql_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

impl From<DaxError> for ApiError {
    fn from(err: DaxError) -> Self {
        match err {
            DaxError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DaxError::Conflict(msg) => ApiError::Conflict(msg),
            DaxError::Validation(msg) | DaxError::Config(msg) => ApiError::BadRequest(msg),
            DaxError::InvalidCredentials => {
                ApiError::Unauthorized("invalid username or password".to_string())
            }
            other => {
                // Storage and I/O details stay in the log.
                tracing::error!(error = %other, "Request failed");
                ApiError::Internal("internal server error".to_string())
            }
        }
    }
}

/// Convert storage results into GraphQL results with an error code.
pub trait GqlResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> GqlResultExt<T> for Result<T, DaxError> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| ApiError::from(e).extend())
    }
}
