//! Driver-agnostic classifier
//!
//! Recognises the generic SQL sentinels only. With the `database` feature
//! it also understands `sqlx::Error`, resolving server errors through their
//! SQL-state.

use std::error::Error as StdError;

use super::{classify_common, unspecified, ErrorClassifier, SqlStateMap};
use crate::dberror::{DbError, DbErrorKind};

#[cfg(feature = "database")]
use super::{find_cause, from_mapping};

/// Classifier for the generic SQL layer
#[derive(Debug, Clone)]
pub struct GenericClassifier {
    #[cfg_attr(not(feature = "database"), allow(dead_code))]
    states: SqlStateMap,
}

impl GenericClassifier {
    /// Create a classifier with the standard SQL-state table
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: SqlStateMap::standard(),
        }
    }

    /// Map a SQL-state or SQL-state class to `kind`, or to "unclassified"
    /// with `None`
    #[must_use]
    pub fn map_state(mut self, state: impl Into<String>, kind: Option<DbErrorKind>) -> Self {
        self.states.insert(state, kind);
        self
    }

    #[cfg(feature = "database")]
    fn classify_sqlx(&self, err: &sqlx::Error) -> Option<Option<DbErrorKind>> {
        use sqlx::Error as E;

        match err {
            E::RowNotFound => Some(Some(DbErrorKind::NoResult)),
            E::PoolTimedOut | E::PoolClosed | E::WorkerCrashed | E::Io(_) | E::Tls(_) => {
                Some(Some(DbErrorKind::ConnectionException))
            }
            E::Decode(_) | E::ColumnDecode { .. } | E::Encode(_) => {
                Some(Some(DbErrorKind::DataException))
            }
            E::ColumnNotFound(_) | E::ColumnIndexOutOfBounds { .. } | E::TypeNotFound { .. } => {
                Some(Some(DbErrorKind::InvalidSyntax))
            }
            E::Database(db_err) => db_err
                .code()
                .and_then(|code| self.states.resolve(code.as_ref())),
            _ => None,
        }
    }
}

impl Default for GenericClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for GenericClassifier {
    fn backend(&self) -> &'static str {
        "generic"
    }

    fn convert(&self, err: &(dyn StdError + 'static)) -> DbError {
        if let Some(db_err) = classify_common(err) {
            return db_err;
        }

        #[cfg(feature = "database")]
        if let Some(sqlx_err) = find_cause::<sqlx::Error>(err) {
            if let Some(mapping) = self.classify_sqlx(sqlx_err) {
                return from_mapping(mapping, err);
            }
        }

        unspecified(self.backend(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{MySqlError, SqlError};

    #[test]
    fn test_sentinels() {
        let classifier = GenericClassifier::new();
        assert!(classifier.convert(&SqlError::NoRows).is(DbErrorKind::NoResult));
        assert!(classifier
            .convert(&SqlError::TxDone)
            .is(DbErrorKind::TransactionDone));
        assert!(classifier
            .convert(&SqlError::ConnDone)
            .is(DbErrorKind::ConnectionException));
    }

    #[test]
    fn test_backend_specific_errors_are_unspecified() {
        let db_err = GenericClassifier::new().convert(&MySqlError::new(1062, "dup"));
        assert!(db_err.is(DbErrorKind::UnspecifiedError));
        assert_eq!(db_err.message, "Error 1062: dup");
    }

    #[cfg(feature = "database")]
    #[test]
    fn test_sqlx_errors() {
        let classifier = GenericClassifier::new();
        assert!(classifier
            .convert(&sqlx::Error::RowNotFound)
            .is(DbErrorKind::NoResult));
        assert!(classifier
            .convert(&sqlx::Error::PoolTimedOut)
            .is(DbErrorKind::ConnectionException));
        assert!(classifier
            .convert(&sqlx::Error::ColumnNotFound("email".to_string()))
            .is(DbErrorKind::InvalidSyntax));
        assert!(classifier
            .convert(&sqlx::Error::Protocol("garbled".to_string()))
            .is(DbErrorKind::UnspecifiedError));
    }
}
