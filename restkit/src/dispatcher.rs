//! Database-to-REST error dispatch
//!
//! A [`Dispatcher`] owns a table from database error kind to the REST error
//! returned to clients. An entry holding `None` suppresses the error (the
//! default for [`DbErrorKind::Warning`]); a kind with no entry at all is
//! reported as [`Error::Unmapped`] so the caller can fall back to a generic
//! server error.
//!
//! # Example
//!
//! ```rust
//! use restkit::dberror::DbErrorKind;
//! use restkit::dispatcher::Dispatcher;
//! use restkit::resterror::RestErrorKind;
//!
//! let dispatcher = Dispatcher::new();
//!
//! let rest = dispatcher
//!     .handle(&DbErrorKind::UniqueViolation.new())
//!     .unwrap()
//!     .unwrap();
//! assert!(rest.is(RestErrorKind::InvalidInput));
//! assert_eq!(rest.status, "400");
//!
//! assert!(dispatcher.handle(&DbErrorKind::Warning.new()).unwrap().is_none());
//! ```

use std::collections::HashMap;

use crate::config::ErrorsConfig;
use crate::dberror::{get_prototype, DbError, DbErrorKind};
use crate::error::{Error, Result};
use crate::resterror::{RestError, RestErrorKind};

/// Table from database error kind to REST error; `None` suppresses
pub type ErrorMap = HashMap<DbErrorKind, Option<RestError>>;

/// Maps canonical database errors to REST errors
#[derive(Debug, Clone)]
pub struct Dispatcher {
    error_map: ErrorMap,
}

impl Dispatcher {
    /// Create a dispatcher with the default table
    #[must_use]
    pub fn new() -> Self {
        Self {
            error_map: default_error_map(),
        }
    }

    /// Create a dispatcher from an explicit table
    #[must_use]
    pub fn with_error_map(error_map: ErrorMap) -> Self {
        Self { error_map }
    }

    /// Create a dispatcher with the default table patched by configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMapping`] when an override or suppression
    /// names an unknown database kind, or an override names an unknown REST
    /// code.
    pub fn from_config(config: &ErrorsConfig) -> Result<Self> {
        let mut dispatcher = Self::new();

        for (db_kind, rest_code) in &config.overrides {
            let kind: DbErrorKind = db_kind.parse()?;
            let rest: RestErrorKind = rest_code.parse()?;
            dispatcher.update_error_entry(kind, Some(rest.new()));
        }

        for db_kind in &config.suppress {
            let kind: DbErrorKind = db_kind.parse()?;
            dispatcher.update_error_entry(kind, None);
        }

        Ok(dispatcher)
    }

    /// Map `err` to the REST error configured for its kind
    ///
    /// Returns `Ok(None)` when the kind is deliberately suppressed. The
    /// returned error is a detached copy; callers may decorate it freely.
    ///
    /// # Errors
    ///
    /// - [`Error::UnrecognizedPrototype`] when `err` carries no known
    ///   identity
    /// - [`Error::Unmapped`] when the table has no entry for the kind
    pub fn handle(&self, err: &DbError) -> Result<Option<RestError>> {
        let kind = get_prototype(err)?.kind()?;
        self.error_map
            .get(&kind)
            .cloned()
            .ok_or(Error::Unmapped { kind })
    }

    /// Replace the whole table
    pub fn load_custom_error_map(&mut self, error_map: ErrorMap) {
        self.error_map = error_map;
    }

    /// Insert or replace the entry for `kind`; `None` suppresses it
    pub fn update_error_entry(&mut self, kind: DbErrorKind, rest: Option<RestError>) {
        self.error_map.insert(kind, rest);
    }

    /// Remove the entry for `kind`, returning it if present
    pub fn remove_error_entry(&mut self, kind: DbErrorKind) -> Option<Option<RestError>> {
        self.error_map.remove(&kind)
    }

    /// The current table
    #[must_use]
    pub fn error_map(&self) -> &ErrorMap {
        &self.error_map
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// REST kind each database kind maps to by default; `None` suppresses
#[must_use]
pub const fn default_rest_kind(kind: DbErrorKind) -> Option<RestErrorKind> {
    use DbErrorKind as K;

    match kind {
        K::Warning => None,
        K::NoResult => Some(RestErrorKind::ResourceNotFound),
        K::DataException
        | K::IntegrityConstraintViolation
        | K::RestrictViolation
        | K::NotNullViolation
        | K::ForeignKeyViolation
        | K::UniqueViolation
        | K::CheckViolation => Some(RestErrorKind::InvalidInput),
        K::InvalidAuthorization | K::InvalidPassword | K::InsufficientPrivilege => {
            Some(RestErrorKind::InsufficientPermissions)
        }
        _ => Some(RestErrorKind::InternalError),
    }
}

/// The default table, covering every database kind
#[must_use]
pub fn default_error_map() -> ErrorMap {
    DbErrorKind::ALL
        .into_iter()
        .map(|kind| (kind, default_rest_kind(kind).map(RestErrorKind::new)))
        .collect()
}
