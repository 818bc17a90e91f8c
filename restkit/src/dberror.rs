//! Canonical database error taxonomy
//!
//! Every driver-specific failure is normalized into one of a fixed set of
//! semantic kinds ([`DbErrorKind`]). Each kind has exactly one immutable
//! prototype held in a process-wide registry; call sites create per-failure
//! instances ([`DbError`]) from a kind and attach a message or source error.
//!
//! Two [`DbError`] values are the same kind when their identities match,
//! whatever their messages say.
//!
//! # Example
//!
//! ```rust
//! use restkit::dberror::{get_prototype, DbErrorKind};
//!
//! let a = DbErrorKind::UniqueViolation.new();
//! let b = DbErrorKind::UniqueViolation.new_with_message("duplicate email");
//! assert!(a.compare(&b));
//!
//! let prototype = get_prototype(&b).unwrap();
//! assert_eq!(prototype.kind().unwrap(), DbErrorKind::UniqueViolation);
//! ```

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use crate::error::{Error, Result};

/// Semantic class of a database failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum DbErrorKind {
    /// Completion with a warning
    Warning = 1,
    /// Query returned no rows where one was expected
    NoResult,
    /// Connection could not be established or was lost
    ConnectionException,
    /// Subquery or insert returned the wrong number of rows or columns
    CardinalityViolation,
    /// Value out of range, truncation, invalid format
    DataException,
    /// Generic integrity constraint violation
    IntegrityConstraintViolation,
    /// Row is still referenced by a restricting constraint
    RestrictViolation,
    /// NULL written to a NOT NULL column
    NotNullViolation,
    /// Referenced row missing or still referenced
    ForeignKeyViolation,
    /// Duplicate value for a unique key
    UniqueViolation,
    /// CHECK constraint failed
    CheckViolation,
    /// Statement not allowed in the current transaction state
    InvalidTransactionState,
    /// Transaction ended in an invalid way
    InvalidTransactionTermination,
    /// Transaction rolled back (deadlock, serialization failure)
    TransactionRollback,
    /// Transaction was already committed or rolled back
    TransactionDone,
    /// Authorization specification rejected
    InvalidAuthorization,
    /// Password rejected
    InvalidPassword,
    /// Schema does not exist
    InvalidSchemaName,
    /// Catalog (database) does not exist
    InvalidCatalogName,
    /// Syntax error or access rule violation
    InvalidSyntax,
    /// Missing privilege for the operation
    InsufficientPrivilege,
    /// Out of memory, disk or connections
    InsufficientResources,
    /// Statement too complex or too large
    ProgramLimitExceeded,
    /// Error external to the database (I/O, corruption)
    SystemError,
    /// Internal database error
    InternalError,
    /// Could not be classified
    UnspecifiedError,
}

#[allow(clippy::new_ret_no_self)]
impl DbErrorKind {
    /// Every kind, in identity order
    pub const ALL: [DbErrorKind; 26] = [
        Self::Warning,
        Self::NoResult,
        Self::ConnectionException,
        Self::CardinalityViolation,
        Self::DataException,
        Self::IntegrityConstraintViolation,
        Self::RestrictViolation,
        Self::NotNullViolation,
        Self::ForeignKeyViolation,
        Self::UniqueViolation,
        Self::CheckViolation,
        Self::InvalidTransactionState,
        Self::InvalidTransactionTermination,
        Self::TransactionRollback,
        Self::TransactionDone,
        Self::InvalidAuthorization,
        Self::InvalidPassword,
        Self::InvalidSchemaName,
        Self::InvalidCatalogName,
        Self::InvalidSyntax,
        Self::InsufficientPrivilege,
        Self::InsufficientResources,
        Self::ProgramLimitExceeded,
        Self::SystemError,
        Self::InternalError,
        Self::UnspecifiedError,
    ];

    /// Stable identity of this kind
    #[must_use]
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Human-readable title shared by every instance of this kind
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::NoResult => "No Result",
            Self::ConnectionException => "Connection exception",
            Self::CardinalityViolation => "Cardinality violation",
            Self::DataException => "Data exception",
            Self::IntegrityConstraintViolation => "Integrity constraint violation",
            Self::RestrictViolation => "Restrict violation",
            Self::NotNullViolation => "Not null violation",
            Self::ForeignKeyViolation => "Foreign key violation",
            Self::UniqueViolation => "Unique violation",
            Self::CheckViolation => "Check violation",
            Self::InvalidTransactionState => "Invalid transaction state",
            Self::InvalidTransactionTermination => "Invalid transaction termination",
            Self::TransactionRollback => "Transaction rollback",
            Self::TransactionDone => "Transaction already committed or rolled back",
            Self::InvalidAuthorization => "Invalid authorization specification",
            Self::InvalidPassword => "Invalid password",
            Self::InvalidSchemaName => "Invalid schema name",
            Self::InvalidCatalogName => "Invalid catalog name",
            Self::InvalidSyntax => "Syntax error or access rule violation",
            Self::InsufficientPrivilege => "Insufficient privilege",
            Self::InsufficientResources => "Insufficient resources",
            Self::ProgramLimitExceeded => "Program limit exceeded",
            Self::SystemError => "System error",
            Self::InternalError => "Internal error",
            Self::UnspecifiedError => "Unspecified error",
        }
    }

    /// snake_case name, as used in configuration files
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::NoResult => "no_result",
            Self::ConnectionException => "connection_exception",
            Self::CardinalityViolation => "cardinality_violation",
            Self::DataException => "data_exception",
            Self::IntegrityConstraintViolation => "integrity_constraint_violation",
            Self::RestrictViolation => "restrict_violation",
            Self::NotNullViolation => "not_null_violation",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::UniqueViolation => "unique_violation",
            Self::CheckViolation => "check_violation",
            Self::InvalidTransactionState => "invalid_transaction_state",
            Self::InvalidTransactionTermination => "invalid_transaction_termination",
            Self::TransactionRollback => "transaction_rollback",
            Self::TransactionDone => "transaction_done",
            Self::InvalidAuthorization => "invalid_authorization",
            Self::InvalidPassword => "invalid_password",
            Self::InvalidSchemaName => "invalid_schema_name",
            Self::InvalidCatalogName => "invalid_catalog_name",
            Self::InvalidSyntax => "invalid_syntax",
            Self::InsufficientPrivilege => "insufficient_privilege",
            Self::InsufficientResources => "insufficient_resources",
            Self::ProgramLimitExceeded => "program_limit_exceeded",
            Self::SystemError => "system_error",
            Self::InternalError => "internal_error",
            Self::UnspecifiedError => "unspecified_error",
        }
    }

    /// The immutable prototype of this kind
    #[must_use]
    pub fn prototype(self) -> &'static DbError {
        &PROTOTYPES[usize::from(self.id()) - 1]
    }

    /// Create an instance of this kind with an empty message
    #[must_use]
    pub fn new(self) -> DbError {
        DbError::from_parts(self.id(), self.title())
    }

    /// Create an instance of this kind carrying `message`
    #[must_use]
    pub fn new_with_message(self, message: impl Into<String>) -> DbError {
        let mut err = self.new();
        err.message = message.into();
        err
    }

    /// Create an instance of this kind whose message is the text of `err`
    #[must_use]
    pub fn new_with_error(self, err: &(dyn StdError + 'static)) -> DbError {
        self.new_with_message(err.to_string())
    }
}

impl fmt::Display for DbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u16> for DbErrorKind {
    type Error = Error;

    fn try_from(id: u16) -> Result<Self> {
        usize::from(id)
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
            .ok_or(Error::UnrecognizedPrototype { id })
    }
}

impl FromStr for DbErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::InvalidMapping(format!("unknown database error kind '{}'", s)))
    }
}

static PROTOTYPES: LazyLock<[DbError; 26]> = LazyLock::new(|| DbErrorKind::ALL.map(DbErrorKind::new));

/// A normalized database error instance
///
/// Equality and hashing look at the identity only; `message` and the
/// source error are per-occurrence diagnostics for operators.
#[derive(Debug, Clone)]
pub struct DbError {
    id: u16,
    title: Cow<'static, str>,
    /// Instance-specific diagnostic text
    pub message: String,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl DbError {
    /// Build a value from a raw identity and title
    ///
    /// Values built this way are only resolvable when `id` belongs to a
    /// known kind; prefer [`DbErrorKind::new`].
    pub fn from_parts(id: u16, title: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            title: title.into(),
            message: String::new(),
            source: None,
        }
    }

    /// Identity of this value
    #[must_use]
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Title of this value
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Resolve the kind this value was created from
    pub fn kind(&self) -> Result<DbErrorKind> {
        DbErrorKind::try_from(self.id)
    }

    /// Whether both values share an identity
    #[must_use]
    pub fn compare(&self, other: &DbError) -> bool {
        self.id == other.id
    }

    /// Whether this value is an instance of `kind`
    #[must_use]
    pub fn is(&self, kind: DbErrorKind) -> bool {
        self.id == kind.id()
    }

    /// Attach an owned source error
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }
}

/// Resolve an instance back to its defining prototype
pub fn get_prototype(err: &DbError) -> Result<&'static DbError> {
    err.kind().map(DbErrorKind::prototype)
}

impl PartialEq for DbError {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl Eq for DbError {}

impl Hash for DbError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{}: {}", self.title, self.message)
        }
    }
}

impl StdError for DbError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct DriverFailure;

    impl fmt::Display for DriverFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "driver exploded")
        }
    }

    impl StdError for DriverFailure {}

    #[test]
    fn test_identities_are_unique_and_ordered() {
        for (index, kind) in DbErrorKind::ALL.iter().enumerate() {
            assert_eq!(usize::from(kind.id()), index + 1);
        }
    }

    #[test]
    fn test_prototype_round_trip_for_every_kind() {
        for kind in DbErrorKind::ALL {
            let prototype = get_prototype(&kind.new()).unwrap();
            assert!(std::ptr::eq(prototype, kind.prototype()));
            assert_eq!(prototype.kind().unwrap(), kind);
            assert_eq!(prototype.title(), kind.title());
            assert!(prototype.message.is_empty());
        }
    }

    #[test]
    fn test_identity_over_structure() {
        let a = DbErrorKind::NoResult.new();
        let b = DbErrorKind::NoResult.new_with_message("x");
        assert!(a.compare(&b));
        assert_eq!(a, b);
        assert_ne!(a.message, b.message);
    }

    #[test]
    fn test_different_kinds_do_not_compare() {
        let a = DbErrorKind::UniqueViolation.new();
        let b = DbErrorKind::ForeignKeyViolation.new();
        assert!(!a.compare(&b));
        assert!(a.is(DbErrorKind::UniqueViolation));
        assert!(!a.is(DbErrorKind::ForeignKeyViolation));
    }

    #[test]
    fn test_unknown_prototype_rejected() {
        let forged = DbError::from_parts(999, "Forged");
        let err = get_prototype(&forged).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedPrototype { id: 999 }));

        let zero = DbError::from_parts(0, "Zero");
        assert!(zero.kind().is_err());
    }

    #[test]
    fn test_hand_built_known_identity_resolves() {
        let hand_built = DbError::from_parts(DbErrorKind::CheckViolation.id(), "whatever");
        assert_eq!(hand_built.kind().unwrap(), DbErrorKind::CheckViolation);
    }

    #[test]
    fn test_new_with_error_copies_text() {
        let err = DbErrorKind::SystemError.new_with_error(&DriverFailure);
        assert_eq!(err.message, "driver exploded");
        assert!(StdError::source(&err).is_none());
    }

    #[test]
    fn test_with_source_exposes_source() {
        let err = DbErrorKind::SystemError.new().with_source(DriverFailure);
        let source = StdError::source(&err).unwrap();
        assert_eq!(source.to_string(), "driver exploded");
    }

    #[test]
    fn test_new_does_not_touch_prototype() {
        let mut instance = DbErrorKind::DataException.new();
        instance.message.push_str("changed");
        assert!(DbErrorKind::DataException.prototype().message.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(DbErrorKind::NoResult.new().to_string(), "No Result");
        assert_eq!(
            DbErrorKind::UniqueViolation
                .new_with_message("users.email")
                .to_string(),
            "Unique violation: users.email"
        );
        assert_eq!(DbErrorKind::NotNullViolation.to_string(), "not_null_violation");
    }

    #[test]
    fn test_from_str_round_trip() {
        for kind in DbErrorKind::ALL {
            assert_eq!(kind.name().parse::<DbErrorKind>().unwrap(), kind);
        }
        assert!("no_such_kind".parse::<DbErrorKind>().is_err());
    }

    #[test]
    fn test_hash_follows_identity() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(DbErrorKind::Warning.new_with_message("a"));
        set.insert(DbErrorKind::Warning.new_with_message("b"));
        assert_eq!(set.len(), 1);
    }
}
