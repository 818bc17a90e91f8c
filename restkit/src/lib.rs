//! # restkit
//!
//! Database error normalization and REST error dispatch for RESTful APIs.
//!
//! ## Features
//!
//! - **Canonical taxonomy**: every driver failure becomes one of a fixed set
//!   of semantic database error kinds
//! - **Backend classifiers**: MySQL, PostgreSQL, SQLite, a driver-agnostic
//!   SQL layer (and `sqlx` with the `database` feature) and an ORM wrapper
//! - **REST taxonomy**: predefined application-facing errors with codes,
//!   titles, HTTP statuses, links and detail
//! - **Dispatch**: a configurable table from database kind to REST error
//! - **axum integration**: [`handlers::ApiError`] implements `IntoResponse`
//!
//! ## Example
//!
//! ```rust
//! use restkit::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = Config::default();
//! let handler = DbErrorHandler::from_config(&config)?;
//!
//! // A repository call failed with a generic "no rows" sentinel
//! let api_error = handler.resolve_raw(&SqlError::NoRows).unwrap();
//! assert!(api_error.error.is(RestErrorKind::ResourceNotFound));
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod dberror;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod resterror;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::classifier::{
        Backend, ErrorClassifier, GenericClassifier, MySqlClassifier, MySqlError, OrmClassifier,
        OrmError, PgError, PostgresClassifier, SqlError, SqliteClassifier, SqliteError,
    };
    pub use crate::config::{Config, ErrorsConfig, ServiceConfig};
    pub use crate::dberror::{get_prototype, DbError, DbErrorKind};
    pub use crate::dispatcher::{Dispatcher, ErrorMap};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, DbErrorHandler, ErrorResponse};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::resterror::{RestError, RestErrorKind};
}
