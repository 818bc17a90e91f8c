//! ORM classifier
//!
//! Wraps a backend classifier. The ORM's own sentinel errors are checked
//! first; anything else is handed to the wrapped classifier unchanged.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use super::{classify_common, find_cause, from_mapping, Backend, ErrorClassifier};
use crate::dberror::{DbError, DbErrorKind};

/// Sentinel errors raised by the ORM layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum OrmError {
    /// A lookup by primary key or condition found nothing
    #[error("record not found")]
    RecordNotFound,
    /// Generated SQL was rejected before reaching the database
    #[error("invalid SQL")]
    InvalidSql,
    /// Commit or rollback without an open transaction
    #[error("no valid transaction")]
    InvalidTransaction,
    /// Begin failed on the underlying connection
    #[error("can't start transaction")]
    CantStartTransaction,
    /// Value passed to the ORM is not addressable
    #[error("using unaddressable value")]
    Unaddressable,
}

impl OrmError {
    /// Canonical kind of this sentinel; `None` when the ORM leaves it
    /// unclassified
    #[must_use]
    pub const fn kind(self) -> Option<DbErrorKind> {
        match self {
            Self::RecordNotFound => Some(DbErrorKind::NoResult),
            Self::InvalidSql => Some(DbErrorKind::InvalidSyntax),
            Self::InvalidTransaction | Self::CantStartTransaction => {
                Some(DbErrorKind::InvalidTransactionState)
            }
            Self::Unaddressable => None,
        }
    }
}

/// Classifier for errors produced through the ORM
#[derive(Clone)]
pub struct OrmClassifier {
    inner: Arc<dyn ErrorClassifier>,
}

impl OrmClassifier {
    /// Wrap the default classifier of `backend`
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            inner: backend.classifier(),
        }
    }

    /// Wrap an existing classifier
    #[must_use]
    pub fn with_classifier(inner: Arc<dyn ErrorClassifier>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for OrmClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrmClassifier")
            .field("inner", &self.inner.backend())
            .finish()
    }
}

impl ErrorClassifier for OrmClassifier {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    fn convert(&self, err: &(dyn StdError + 'static)) -> DbError {
        if let Some(db_err) = classify_common(err) {
            return db_err;
        }

        if let Some(orm_err) = find_cause::<OrmError>(err) {
            return from_mapping(orm_err.kind(), err);
        }

        self.inner.convert(err)
    }
}
