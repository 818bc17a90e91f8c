//! Handler-side error plumbing for axum services
//!
//! This module connects the classification and dispatch core to HTTP
//! responses.
//!
//! # Features
//!
//! - **Error Handling**: [`DbErrorHandler`] classifies a repository failure
//!   and dispatches it to an [`ApiError`] in one call
//! - **Responses**: [`ApiError`] implements `IntoResponse`, rendering an
//!   [`ErrorResponse`] envelope with the matching HTTP status
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{extract::{Path, State}, Json};
//! use restkit::handlers::{ApiError, DbErrorHandler};
//!
//! async fn get_order(
//!     State(state): State<AppState>,
//!     Path(id): Path<i64>,
//! ) -> Result<Json<Order>, ApiError> {
//!     match state.repository.find_by_id(id).await {
//!         Ok(order) => Ok(Json(order)),
//!         Err(e) => Err(state
//!             .errors
//!             .resolve_raw(&e)
//!             .unwrap_or_else(ApiError::internal)),
//!     }
//! }
//! ```

mod db;
mod error;
mod response;

pub use db::DbErrorHandler;
pub use error::ApiError;
pub use response::ErrorResponse;
