//! Backend error classifiers
//!
//! A classifier turns a raw, driver-specific error into a canonical
//! [`DbError`]. Classification is pure and total: every input yields a
//! value, and anything unrecognised becomes
//! [`DbErrorKind::UnspecifiedError`].
//!
//! Each backend checks, in order and stopping at the first match:
//!
//! 1. sentinel errors (generic SQL layer and driver-native),
//! 2. the exact backend code,
//! 3. the SQL-state (derived from the code, or native),
//! 4. the SQL-state class (its first two characters).
//!
//! Tables map a key to `Option<DbErrorKind>`. A `None` value marks a code
//! the backend knows but that is deliberately left unclassified: the search
//! stops there and the result is `UnspecifiedError`. An absent key lets the
//! search continue to the next stage.
//!
//! # Example
//!
//! ```rust
//! use restkit::classifier::{Backend, MySqlError};
//! use restkit::dberror::DbErrorKind;
//!
//! let classifier = Backend::MySql.classifier();
//! let err = MySqlError::new(1062, "Duplicate entry 'a@b.c' for key 'email'");
//! assert!(classifier.convert(&err).is(DbErrorKind::UniqueViolation));
//! ```

mod generic;
mod mysql;
mod orm;
mod postgres;
mod sqlite;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dberror::{DbError, DbErrorKind};

pub use generic::GenericClassifier;
pub use mysql::{MySqlClassifier, MySqlDriverError, MySqlError};
pub use orm::{OrmClassifier, OrmError};
pub use postgres::{PgDriverError, PgError, PostgresClassifier};
pub use sqlite::{ExtendedCode, SqliteClassifier, SqliteCode, SqliteError};

/// Converts raw backend errors into canonical database errors
pub trait ErrorClassifier: Send + Sync {
    /// Short backend name used in log events
    fn backend(&self) -> &'static str;

    /// Classify `err`; never fails
    fn convert(&self, err: &(dyn StdError + 'static)) -> DbError;
}

/// Sentinel errors of the generic SQL layer, shared by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SqlError {
    /// A single-row query matched nothing
    #[error("sql: no rows in result set")]
    NoRows,
    /// Operation on a transaction that was already committed or rolled back
    #[error("sql: transaction has already been committed or rolled back")]
    TxDone,
    /// Operation on a closed connection
    #[error("sql: connection is already closed")]
    ConnDone,
}

impl SqlError {
    /// Canonical kind of this sentinel
    #[must_use]
    pub const fn kind(self) -> DbErrorKind {
        match self {
            Self::NoRows => DbErrorKind::NoResult,
            Self::TxDone => DbErrorKind::TransactionDone,
            Self::ConnDone => DbErrorKind::ConnectionException,
        }
    }
}

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// MySQL / MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
    /// SQLite
    Sqlite,
    /// Driver-agnostic SQL layer (and `sqlx` with the `database` feature)
    #[default]
    Generic,
}

impl Backend {
    /// Build the default classifier for this backend
    #[must_use]
    pub fn classifier(self) -> Arc<dyn ErrorClassifier> {
        match self {
            Self::MySql => Arc::new(MySqlClassifier::new()),
            Self::Postgres => Arc::new(PostgresClassifier::new()),
            Self::Sqlite => Arc::new(SqliteClassifier::new()),
            Self::Generic => Arc::new(GenericClassifier::new()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MySql => write!(f, "mysql"),
            Self::Postgres => write!(f, "postgres"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Lookup table keyed by SQL-state (five characters) or SQL-state class
/// (two characters)
#[derive(Debug, Clone, Default)]
pub struct SqlStateMap {
    entries: HashMap<String, Option<DbErrorKind>>,
}

impl SqlStateMap {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the standard SQL-state classes and the constraint,
    /// authorization and syntax states shared across backends
    #[must_use]
    pub fn standard() -> Self {
        use DbErrorKind as K;

        let mut map = Self::new();
        for (class, kind) in [
            ("01", K::Warning),
            ("02", K::NoResult),
            ("08", K::ConnectionException),
            ("21", K::CardinalityViolation),
            ("22", K::DataException),
            ("23", K::IntegrityConstraintViolation),
            ("25", K::InvalidTransactionState),
            ("28", K::InvalidAuthorization),
            ("2D", K::InvalidTransactionTermination),
            ("3D", K::InvalidCatalogName),
            ("3F", K::InvalidSchemaName),
            ("40", K::TransactionRollback),
            ("42", K::InvalidSyntax),
            ("53", K::InsufficientResources),
            ("54", K::ProgramLimitExceeded),
            ("58", K::SystemError),
            ("XX", K::InternalError),
        ] {
            map.insert(class, Some(kind));
        }

        for (state, kind) in [
            ("23000", K::IntegrityConstraintViolation),
            ("23001", K::RestrictViolation),
            ("23502", K::NotNullViolation),
            ("23503", K::ForeignKeyViolation),
            ("23505", K::UniqueViolation),
            ("23514", K::CheckViolation),
            ("28P01", K::InvalidPassword),
            ("42501", K::InsufficientPrivilege),
            ("42601", K::InvalidSyntax),
        ] {
            map.insert(state, Some(kind));
        }

        // feature_not_supported
        map.insert("0A000", None);
        map
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, kind: Option<DbErrorKind>) {
        self.entries.insert(key.into(), kind);
    }

    /// Exact lookup; the outer `Option` is `None` when the key is absent
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Option<DbErrorKind>> {
        self.entries.get(key).copied()
    }

    /// Look up `state`, then its class
    #[must_use]
    pub fn resolve(&self, state: &str) -> Option<Option<DbErrorKind>> {
        self.get(state)
            .or_else(|| state.get(..2).and_then(|class| self.get(class)))
    }
}

/// Search `err` and its source chain for a value of type `T`
pub(crate) fn find_cause<'a, T>(err: &'a (dyn StdError + 'static)) -> Option<&'a T>
where
    T: StdError + 'static,
{
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<T>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}

/// Checks shared by every classifier: already-classified values and
/// generic SQL sentinels
///
/// A `DbError` whose identity matches no kind is not passed through; it
/// falls to the later stages and ends up `UnspecifiedError`.
pub(crate) fn classify_common(err: &(dyn StdError + 'static)) -> Option<DbError> {
    if let Some(db_err) = find_cause::<DbError>(err).filter(|db_err| db_err.kind().is_ok()) {
        return Some(db_err.clone());
    }
    find_cause::<SqlError>(err).map(|sentinel| sentinel.kind().new_with_error(err))
}

/// Turn a table hit into an instance; `None` hits become `UnspecifiedError`
pub(crate) fn from_mapping(mapping: Option<DbErrorKind>, err: &(dyn StdError + 'static)) -> DbError {
    mapping
        .unwrap_or(DbErrorKind::UnspecifiedError)
        .new_with_error(err)
}

/// Fallback when no stage matched
pub(crate) fn unspecified(backend: &'static str, err: &(dyn StdError + 'static)) -> DbError {
    tracing::debug!(backend, error = %err, "Unrecognised database error");
    DbErrorKind::UnspecifiedError.new_with_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapper(SqlError);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "repository failed")
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_sql_error_kinds() {
        assert_eq!(SqlError::NoRows.kind(), DbErrorKind::NoResult);
        assert_eq!(SqlError::TxDone.kind(), DbErrorKind::TransactionDone);
        assert_eq!(SqlError::ConnDone.kind(), DbErrorKind::ConnectionException);
    }

    #[test]
    fn test_find_cause_walks_source_chain() {
        let wrapped = Wrapper(SqlError::TxDone);
        assert_eq!(find_cause::<SqlError>(&wrapped), Some(&SqlError::TxDone));
        assert!(find_cause::<DbError>(&wrapped).is_none());
    }

    #[test]
    fn test_classify_common_keeps_outer_message() {
        let wrapped = Wrapper(SqlError::NoRows);
        let db_err = classify_common(&wrapped).unwrap();
        assert!(db_err.is(DbErrorKind::NoResult));
        assert_eq!(db_err.message, "repository failed");
    }

    #[test]
    fn test_classify_common_passes_classified_errors_through() {
        let original = DbErrorKind::CheckViolation.new_with_message("age > 0");
        let db_err = classify_common(&original).unwrap();
        assert!(db_err.compare(&original));
        assert_eq!(db_err.message, "age > 0");
    }

    #[test]
    fn test_unknown_identity_is_not_passed_through() {
        let forged = DbError::from_parts(999, "Forged");
        assert!(classify_common(&forged).is_none());

        for backend in [Backend::MySql, Backend::Postgres, Backend::Sqlite, Backend::Generic] {
            let db_err = backend.classifier().convert(&forged);
            assert!(db_err.is(DbErrorKind::UnspecifiedError), "{}", backend);
            assert!(db_err.kind().is_ok(), "{}", backend);
        }
    }

    #[test]
    fn test_state_map_exact_before_class() {
        let map = SqlStateMap::standard();
        assert_eq!(map.resolve("23505"), Some(Some(DbErrorKind::UniqueViolation)));
        assert_eq!(
            map.resolve("23999"),
            Some(Some(DbErrorKind::IntegrityConstraintViolation))
        );
        assert_eq!(map.resolve("HY000"), None);
    }

    #[test]
    fn test_state_map_explicit_none_is_not_absent() {
        let map = SqlStateMap::standard();
        assert_eq!(map.get("0A000"), Some(None));
        assert_eq!(map.get("0A001"), None);
        // class lookup is not attempted once an exact entry exists
        assert_eq!(map.resolve("0A000"), Some(None));
    }

    #[test]
    fn test_state_map_short_and_non_ascii_keys() {
        let map = SqlStateMap::standard();
        assert_eq!(map.resolve(""), None);
        assert_eq!(map.resolve("2"), None);
        assert_eq!(map.resolve("é3000"), None);
    }

    #[test]
    fn test_backend_serde_names() {
        let backend: Backend = serde_json::from_str("\"mysql\"").unwrap();
        assert_eq!(backend, Backend::MySql);
        assert_eq!(serde_json::to_string(&Backend::Postgres).unwrap(), "\"postgres\"");
        assert_eq!(Backend::default(), Backend::Generic);
        assert_eq!(Backend::Sqlite.to_string(), "sqlite");
    }

    #[test]
    fn test_backend_classifiers_are_total_on_unrelated_errors() {
        let unrelated = std::io::Error::other("disk on fire");
        for backend in [Backend::MySql, Backend::Postgres, Backend::Sqlite, Backend::Generic] {
            let classifier = backend.classifier();
            let db_err = classifier.convert(&unrelated);
            assert!(db_err.is(DbErrorKind::UnspecifiedError), "{}", backend);
            assert_eq!(db_err.message, "disk on fire");
        }
    }

    #[test]
    fn test_backend_classifiers_recognise_generic_sentinels() {
        for backend in [Backend::MySql, Backend::Postgres, Backend::Sqlite, Backend::Generic] {
            let classifier = backend.classifier();
            assert!(classifier.convert(&SqlError::NoRows).is(DbErrorKind::NoResult));
            assert!(classifier
                .convert(&SqlError::TxDone)
                .is(DbErrorKind::TransactionDone));
        }
    }
}
