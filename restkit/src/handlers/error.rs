//! API error type for handler return values
//!
//! [`ApiError`] pairs a [`RestError`] with the HTTP status it is sent with,
//! and renders as an [`ErrorResponse`] via `IntoResponse`.
//!
//! # Example
//!
//! ```rust
//! use axum::http::StatusCode;
//! use restkit::handlers::ApiError;
//! use restkit::resterror::RestErrorKind;
//!
//! let error = ApiError::from(RestErrorKind::ResourceNotFound);
//! assert_eq!(error.status, StatusCode::NOT_FOUND);
//! assert_eq!(error.error.code, "RESOURCE_NOT_FOUND");
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::response::ErrorResponse;
use crate::resterror::{RestError, RestErrorKind};

/// A REST error ready to be returned from an axum handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error sent in the response body
    pub error: RestError,
    /// Response status
    pub status: StatusCode,
}

impl ApiError {
    /// Wrap `error`, deriving the status from its `status` field
    pub fn new(error: RestError) -> Self {
        let status = error.status_code();
        Self { error, status }
    }

    /// Generic server error used when nothing more specific is known
    pub fn internal() -> Self {
        Self::from(RestErrorKind::InternalError)
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.status,
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS
        )
    }
}

impl From<RestError> for ApiError {
    fn from(error: RestError) -> Self {
        Self::new(error)
    }
}

impl From<RestErrorKind> for ApiError {
    fn from(kind: RestErrorKind) -> Self {
        Self::new(kind.new())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error ({}): {}",
            self.error.code,
            self.status.as_u16(),
            self.error.title
        )
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                code = %self.error.code,
                status = self.status.as_u16(),
                id = ?self.error.id,
                retriable = self.is_retriable(),
                "API error: {}", self.error.title
            );
        } else {
            tracing::debug!(
                code = %self.error.code,
                status = self.status.as_u16(),
                id = ?self.error.id,
                "API error: {}", self.error.title
            );
        }

        let status = self.status;
        (status, ErrorResponse::new(self.error)).into_response()
    }
}
