//! Error response envelope
//!
//! Every error reaches the client as `{"errors": [ ... ]}`, one entry per
//! [`RestError`].

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::resterror::RestError;

/// Response body for one or more REST errors
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// The errors, most significant first
    pub errors: Vec<RestError>,
}

impl ErrorResponse {
    /// Wrap a single error
    pub fn new(error: RestError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Append another error
    #[must_use]
    pub fn with_error(mut self, error: RestError) -> Self {
        self.errors.push(error);
        self
    }
}

impl From<RestError> for ErrorResponse {
    fn from(error: RestError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for ErrorResponse {
    /// Status is taken from the first error; an empty envelope is a 500
    fn into_response(self) -> Response {
        let status = self
            .errors
            .first()
            .map(RestError::status_code)
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}
