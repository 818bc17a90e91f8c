//! PostgreSQL classifier
//!
//! PostgreSQL reports the SQL-state natively, so the exact code and its
//! class are looked up in a single SQL-state table.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use super::{classify_common, find_cause, from_mapping, unspecified, ErrorClassifier, SqlStateMap};
use crate::dberror::{DbError, DbErrorKind};

/// Structured error returned by a PostgreSQL server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgError {
    /// ERROR, FATAL, PANIC, ...
    pub severity: String,
    /// Five-character SQL-state
    pub code: String,
    /// Primary message
    pub message: String,
    /// Optional secondary message
    pub detail: Option<String>,
    /// Optional suggestion
    pub hint: Option<String>,
    /// Table involved, when reported
    pub table: Option<String>,
    /// Constraint involved, when reported
    pub constraint: Option<String>,
}

impl PgError {
    /// Create an `ERROR` severity error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: "ERROR".to_string(),
            code: code.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach the violated constraint name
    #[must_use]
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    /// Attach the secondary message
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for PgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pq: {}", self.message)
    }
}

impl StdError for PgError {}

/// Client-side failures raised by the PostgreSQL driver itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum PgDriverError {
    /// Server refused an SSL connection
    #[error("pq: SSL is not enabled on the server")]
    SslNotSupported,
    /// Private key file is world-readable
    #[error("pq: Private key file has group or world access")]
    SslKeyHasWorldPermissions,
    /// No user name given and none could be derived
    #[error("pq: Could not detect default username")]
    CouldNotDetectUsername,
}

impl PgDriverError {
    /// Canonical kind of this sentinel; every driver failure is a
    /// connection problem
    #[must_use]
    pub const fn kind(self) -> DbErrorKind {
        DbErrorKind::ConnectionException
    }
}

/// Classifier for PostgreSQL server and driver errors
#[derive(Debug, Clone)]
pub struct PostgresClassifier {
    states: SqlStateMap,
}

impl PostgresClassifier {
    /// Create a classifier with the default tables
    #[must_use]
    pub fn new() -> Self {
        let mut states = SqlStateMap::standard();
        // exclusion_violation
        states.insert("23P01", Some(DbErrorKind::IntegrityConstraintViolation));
        // in_failed_sql_transaction
        states.insert("25P02", Some(DbErrorKind::InvalidTransactionState));
        // deadlock_detected
        states.insert("40P01", Some(DbErrorKind::TransactionRollback));
        // undefined_table, undefined_column
        states.insert("42P01", Some(DbErrorKind::InvalidSyntax));
        states.insert("42703", Some(DbErrorKind::InvalidSyntax));
        // admin_shutdown, crash_shutdown, cannot_connect_now
        for state in ["57P01", "57P02", "57P03"] {
            states.insert(state, Some(DbErrorKind::ConnectionException));
        }
        Self { states }
    }

    /// Map a SQL-state or SQL-state class to `kind`, or to "unclassified"
    /// with `None`
    #[must_use]
    pub fn map_code(mut self, code: impl Into<String>, kind: Option<DbErrorKind>) -> Self {
        self.states.insert(code, kind);
        self
    }
}

impl Default for PostgresClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for PostgresClassifier {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn convert(&self, err: &(dyn StdError + 'static)) -> DbError {
        if let Some(db_err) = classify_common(err) {
            return db_err;
        }

        if let Some(driver) = find_cause::<PgDriverError>(err) {
            return driver.kind().new_with_error(err);
        }

        if let Some(pg_err) = find_cause::<PgError>(err) {
            if let Some(mapping) = self.states.resolve(&pg_err.code) {
                return from_mapping(mapping, err);
            }
        }

        unspecified(self.backend(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(err: &(dyn StdError + 'static)) -> DbError {
        PostgresClassifier::new().convert(err)
    }

    #[test]
    fn test_unique_violation_exact_code() {
        let err = PgError::new("23505", "duplicate key value violates unique constraint")
            .with_constraint("users_email_key");
        let db_err = convert(&err);
        assert!(db_err.is(DbErrorKind::UniqueViolation));
        assert_eq!(
            db_err.message,
            "pq: duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_exact_codes() {
        let cases = [
            ("23001", DbErrorKind::RestrictViolation),
            ("23502", DbErrorKind::NotNullViolation),
            ("23503", DbErrorKind::ForeignKeyViolation),
            ("23514", DbErrorKind::CheckViolation),
            ("28P01", DbErrorKind::InvalidPassword),
            ("42501", DbErrorKind::InsufficientPrivilege),
            ("42601", DbErrorKind::InvalidSyntax),
            ("40P01", DbErrorKind::TransactionRollback),
            ("57P01", DbErrorKind::ConnectionException),
        ];
        for (code, kind) in cases {
            assert!(convert(&PgError::new(code, "boom")).is(kind), "{}", code);
        }
    }

    #[test]
    fn test_class_fallback() {
        let cases = [
            ("23P99", DbErrorKind::IntegrityConstraintViolation),
            ("22012", DbErrorKind::DataException),
            ("08006", DbErrorKind::ConnectionException),
            ("53100", DbErrorKind::InsufficientResources),
            ("54001", DbErrorKind::ProgramLimitExceeded),
            ("3D000", DbErrorKind::InvalidCatalogName),
            ("3F000", DbErrorKind::InvalidSchemaName),
            ("XX001", DbErrorKind::InternalError),
            ("01000", DbErrorKind::Warning),
            ("02000", DbErrorKind::NoResult),
        ];
        for (code, kind) in cases {
            assert!(convert(&PgError::new(code, "boom")).is(kind), "{}", code);
        }
    }

    #[test]
    fn test_mapped_to_none_differs_from_absent() {
        let classifier = PostgresClassifier::new().map_code("23P01", None);
        assert!(classifier
            .convert(&PgError::new("23P01", "exclusion"))
            .is(DbErrorKind::UnspecifiedError));
        assert!(classifier
            .convert(&PgError::new("23P02", "absent"))
            .is(DbErrorKind::IntegrityConstraintViolation));
    }

    #[test]
    fn test_feature_not_supported_is_unclassified() {
        assert!(convert(&PgError::new("0A000", "not supported")).is(DbErrorKind::UnspecifiedError));
    }

    #[test]
    fn test_unknown_class_is_unspecified() {
        assert!(convert(&PgError::new("P0001", "raise")).is(DbErrorKind::UnspecifiedError));
        assert!(convert(&PgError::new("", "empty")).is(DbErrorKind::UnspecifiedError));
    }

    #[test]
    fn test_driver_sentinels() {
        assert!(convert(&PgDriverError::SslNotSupported).is(DbErrorKind::ConnectionException));
        assert!(convert(&PgDriverError::CouldNotDetectUsername)
            .is(DbErrorKind::ConnectionException));
    }

    #[test]
    fn test_mysql_errors_are_not_recognised() {
        let err = crate::classifier::MySqlError::new(1062, "dup");
        assert!(convert(&err).is(DbErrorKind::UnspecifiedError));
    }
}
