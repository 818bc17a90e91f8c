//! SQLite classifier
//!
//! SQLite has no SQL-state. Errors carry a primary result code and an
//! extended result code whose low byte is the primary code; the extended
//! code is checked first.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use super::{classify_common, find_cause, from_mapping, unspecified, ErrorClassifier};
use crate::dberror::{DbError, DbErrorKind};

/// SQLite primary result codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SqliteCode {
    /// Generic error
    Error = 1,
    /// Internal logic error in SQLite
    Internal = 2,
    /// Access permission denied
    Perm = 3,
    /// Callback routine requested an abort
    Abort = 4,
    /// The database file is locked
    Busy = 5,
    /// A table in the database is locked
    Locked = 6,
    /// A malloc() failed
    NoMem = 7,
    /// Attempt to write a readonly database
    ReadOnly = 8,
    /// Operation terminated by sqlite3_interrupt()
    Interrupt = 9,
    /// Some kind of disk I/O error occurred
    IoErr = 10,
    /// The database disk image is malformed
    Corrupt = 11,
    /// Unknown opcode in sqlite3_file_control()
    NotFound = 12,
    /// Insertion failed because database is full
    Full = 13,
    /// Unable to open the database file
    CantOpen = 14,
    /// Database lock protocol error
    Protocol = 15,
    /// Internal use only
    Empty = 16,
    /// The database schema changed
    Schema = 17,
    /// String or BLOB exceeds size limit
    TooBig = 18,
    /// Abort due to constraint violation
    Constraint = 19,
    /// Data type mismatch
    Mismatch = 20,
    /// Library used incorrectly
    Misuse = 21,
    /// Uses OS features not supported on host
    NoLfs = 22,
    /// Authorization denied
    Auth = 23,
    /// Not used
    Format = 24,
    /// Bind parameter out of range
    Range = 25,
    /// File opened that is not a database file
    NotADb = 26,
    /// Notifications from sqlite3_log()
    Notice = 27,
    /// Warnings from sqlite3_log()
    Warning = 28,
}

/// SQLite extended result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtendedCode(pub i32);

impl ExtendedCode {
    /// CHECK constraint failed
    pub const CONSTRAINT_CHECK: Self = Self(19 | (1 << 8));
    /// Commit hook requested a rollback
    pub const CONSTRAINT_COMMIT_HOOK: Self = Self(19 | (2 << 8));
    /// FOREIGN KEY constraint failed
    pub const CONSTRAINT_FOREIGN_KEY: Self = Self(19 | (3 << 8));
    /// Application-defined function raised a constraint error
    pub const CONSTRAINT_FUNCTION: Self = Self(19 | (4 << 8));
    /// NOT NULL constraint failed
    pub const CONSTRAINT_NOT_NULL: Self = Self(19 | (5 << 8));
    /// PRIMARY KEY constraint failed
    pub const CONSTRAINT_PRIMARY_KEY: Self = Self(19 | (6 << 8));
    /// RAISE in a trigger
    pub const CONSTRAINT_TRIGGER: Self = Self(19 | (7 << 8));
    /// UNIQUE constraint failed
    pub const CONSTRAINT_UNIQUE: Self = Self(19 | (8 << 8));
    /// Virtual table constraint failed
    pub const CONSTRAINT_VTAB: Self = Self(19 | (9 << 8));
    /// Rowid is not unique
    pub const CONSTRAINT_ROWID: Self = Self(19 | (10 << 8));
    /// Write to a read-only database after recovery
    pub const READONLY_RECOVERY: Self = Self(8 | (1 << 8));
    /// Database file moved or unlinked
    pub const READONLY_DBMOVED: Self = Self(8 | (4 << 8));
    /// Busy because of WAL recovery
    pub const BUSY_RECOVERY: Self = Self(5 | (1 << 8));
    /// Busy because of a snapshot conflict
    pub const BUSY_SNAPSHOT: Self = Self(5 | (2 << 8));
    /// Out of memory during I/O
    pub const IOERR_NOMEM: Self = Self(10 | (12 << 8));
}

/// Error returned by SQLite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteError {
    /// Primary result code
    pub code: SqliteCode,
    /// Extended result code
    pub extended_code: ExtendedCode,
    /// Message from sqlite3_errmsg(), if any
    pub message: Option<String>,
}

impl SqliteError {
    /// Create an error whose extended code equals its primary code
    pub fn new(code: SqliteCode) -> Self {
        Self {
            code,
            extended_code: ExtendedCode(code as i32),
            message: None,
        }
    }

    /// Set the extended result code
    #[must_use]
    pub fn with_extended_code(mut self, extended_code: ExtendedCode) -> Self {
        self.extended_code = extended_code;
        self
    }

    /// Set the message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for SqliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message {
            Some(ref message) => f.write_str(message),
            None => write!(
                f,
                "sqlite error {} (extended {})",
                self.code as i32, self.extended_code.0
            ),
        }
    }
}

impl StdError for SqliteError {}

/// Classifier for SQLite errors
#[derive(Debug, Clone)]
pub struct SqliteClassifier {
    extended: HashMap<ExtendedCode, Option<DbErrorKind>>,
    primary: HashMap<SqliteCode, Option<DbErrorKind>>,
}

impl SqliteClassifier {
    /// Create a classifier with the default tables
    #[must_use]
    pub fn new() -> Self {
        use DbErrorKind as K;

        let extended = [
            (ExtendedCode::CONSTRAINT_CHECK, Some(K::CheckViolation)),
            (ExtendedCode::CONSTRAINT_FOREIGN_KEY, Some(K::ForeignKeyViolation)),
            (ExtendedCode::CONSTRAINT_NOT_NULL, Some(K::NotNullViolation)),
            (ExtendedCode::CONSTRAINT_PRIMARY_KEY, Some(K::UniqueViolation)),
            (ExtendedCode::CONSTRAINT_UNIQUE, Some(K::UniqueViolation)),
            (ExtendedCode::CONSTRAINT_ROWID, Some(K::UniqueViolation)),
            (ExtendedCode::CONSTRAINT_COMMIT_HOOK, Some(K::TransactionRollback)),
            (ExtendedCode::CONSTRAINT_TRIGGER, None),
            (ExtendedCode::READONLY_DBMOVED, Some(K::SystemError)),
            (ExtendedCode::BUSY_SNAPSHOT, Some(K::TransactionRollback)),
            (ExtendedCode::IOERR_NOMEM, Some(K::InsufficientResources)),
        ]
        .into_iter()
        .collect();

        let primary = [
            (SqliteCode::Error, Some(K::InvalidSyntax)),
            (SqliteCode::Internal, Some(K::InternalError)),
            (SqliteCode::Perm, Some(K::InsufficientPrivilege)),
            (SqliteCode::Abort, Some(K::TransactionRollback)),
            (SqliteCode::Busy, Some(K::TransactionRollback)),
            (SqliteCode::Locked, Some(K::TransactionRollback)),
            (SqliteCode::NoMem, Some(K::InsufficientResources)),
            (SqliteCode::ReadOnly, Some(K::InsufficientPrivilege)),
            (SqliteCode::Interrupt, None),
            (SqliteCode::IoErr, Some(K::SystemError)),
            (SqliteCode::Corrupt, Some(K::SystemError)),
            (SqliteCode::NotFound, Some(K::InternalError)),
            (SqliteCode::Full, Some(K::InsufficientResources)),
            (SqliteCode::CantOpen, Some(K::ConnectionException)),
            (SqliteCode::Protocol, Some(K::SystemError)),
            (SqliteCode::Empty, Some(K::InternalError)),
            (SqliteCode::Schema, Some(K::InvalidSchemaName)),
            (SqliteCode::TooBig, Some(K::ProgramLimitExceeded)),
            (SqliteCode::Constraint, Some(K::IntegrityConstraintViolation)),
            (SqliteCode::Mismatch, Some(K::DataException)),
            (SqliteCode::Misuse, Some(K::InternalError)),
            (SqliteCode::NoLfs, Some(K::SystemError)),
            (SqliteCode::Auth, Some(K::InvalidAuthorization)),
            (SqliteCode::Range, Some(K::DataException)),
            (SqliteCode::NotADb, Some(K::ConnectionException)),
            (SqliteCode::Notice, Some(K::Warning)),
            (SqliteCode::Warning, Some(K::Warning)),
        ]
        .into_iter()
        .collect();

        Self { extended, primary }
    }

    /// Map an extended code to `kind`, or to "unclassified" with `None`
    #[must_use]
    pub fn map_extended(mut self, code: ExtendedCode, kind: Option<DbErrorKind>) -> Self {
        self.extended.insert(code, kind);
        self
    }

    /// Map a primary code to `kind`, or to "unclassified" with `None`
    #[must_use]
    pub fn map_code(mut self, code: SqliteCode, kind: Option<DbErrorKind>) -> Self {
        self.primary.insert(code, kind);
        self
    }

    fn classify(&self, err: &SqliteError) -> Option<Option<DbErrorKind>> {
        self.extended
            .get(&err.extended_code)
            .or_else(|| self.primary.get(&err.code))
            .copied()
    }
}

impl Default for SqliteClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for SqliteClassifier {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn convert(&self, err: &(dyn StdError + 'static)) -> DbError {
        if let Some(db_err) = classify_common(err) {
            return db_err;
        }

        if let Some(sqlite_err) = find_cause::<SqliteError>(err) {
            if let Some(mapping) = self.classify(sqlite_err) {
                return from_mapping(mapping, err);
            }
        }

        unspecified(self.backend(), err)
    }
}
