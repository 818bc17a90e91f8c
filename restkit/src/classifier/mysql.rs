//! MySQL / MariaDB classifier
//!
//! MySQL reports a numeric error number and, depending on the client,
//! may or may not carry the SQL-state. The classifier looks up the exact
//! number first, then derives the SQL-state from the number, and only
//! then falls back to the state sent by the server.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use super::{classify_common, find_cause, from_mapping, unspecified, ErrorClassifier, SqlStateMap};
use crate::dberror::{DbError, DbErrorKind, DbErrorKind as K};

/// Structured error returned by a MySQL server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlError {
    /// Server error number (e.g. 1062 for a duplicate entry)
    pub number: u16,
    /// Five-character SQL-state, when the client reports it
    pub sql_state: Option<String>,
    /// Server message
    pub message: String,
}

impl MySqlError {
    /// Create an error without SQL-state
    pub fn new(number: u16, message: impl Into<String>) -> Self {
        Self {
            number,
            sql_state: None,
            message: message.into(),
        }
    }

    /// Attach the SQL-state reported by the server
    #[must_use]
    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }
}

impl fmt::Display for MySqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sql_state {
            Some(ref state) => write!(f, "Error {} ({}): {}", self.number, state, self.message),
            None => write!(f, "Error {}: {}", self.number, self.message),
        }
    }
}

impl StdError for MySqlError {}

/// Client-side failures raised by the MySQL driver itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MySqlDriverError {
    /// Connection is no longer usable
    #[error("invalid connection")]
    InvalidConn,
    /// Malformed packet received
    #[error("malformed packet")]
    MalformedPacket,
    /// TLS requested but not supported by the server
    #[error("TLS requested but server does not support TLS")]
    NoTls,
    /// Protocol out of sync
    #[error("commands out of sync. You can't run this command now")]
    PktSync,
    /// Protocol out of sync, multiple results pending
    #[error("commands out of sync. Did you run multiple statements at once?")]
    PktSyncMul,
    /// Packet exceeds `max_allowed_packet`
    #[error("packet for query is too large")]
    PktTooLarge,
    /// Read buffer still in use
    #[error("busy buffer")]
    BusyBuffer,
}

impl MySqlDriverError {
    /// Canonical kind of this sentinel
    #[must_use]
    pub const fn kind(self) -> DbErrorKind {
        match self {
            Self::PktTooLarge => DbErrorKind::ProgramLimitExceeded,
            Self::BusyBuffer => DbErrorKind::InternalError,
            Self::InvalidConn
            | Self::MalformedPacket
            | Self::NoTls
            | Self::PktSync
            | Self::PktSyncMul => DbErrorKind::ConnectionException,
        }
    }
}

/// Error numbers with a precise canonical kind
const CODES: &[(u16, Option<DbErrorKind>)] = &[
    // ER_DUP_KEY, ER_DUP_ENTRY, ER_DUP_UNIQUE, ER_DUP_ENTRY_WITH_KEY_NAME
    (1022, Some(K::UniqueViolation)),
    (1062, Some(K::UniqueViolation)),
    (1169, Some(K::UniqueViolation)),
    (1586, Some(K::UniqueViolation)),
    // ER_NO_REFERENCED_ROW(_2), ER_ROW_IS_REFERENCED(_2)
    (1216, Some(K::ForeignKeyViolation)),
    (1217, Some(K::ForeignKeyViolation)),
    (1451, Some(K::ForeignKeyViolation)),
    (1452, Some(K::ForeignKeyViolation)),
    // ER_BAD_NULL_ERROR, ER_NO_DEFAULT_FOR_FIELD
    (1048, Some(K::NotNullViolation)),
    (1364, Some(K::NotNullViolation)),
    // ER_CHECK_CONSTRAINT_VIOLATED
    (3819, Some(K::CheckViolation)),
    // ER_ACCESS_DENIED_ERROR, ER_HOST_NOT_PRIVILEGED
    (1045, Some(K::InvalidAuthorization)),
    (1130, Some(K::InvalidAuthorization)),
    // database, table, column and specific access denied
    (1044, Some(K::InsufficientPrivilege)),
    (1142, Some(K::InsufficientPrivilege)),
    (1143, Some(K::InsufficientPrivilege)),
    (1227, Some(K::InsufficientPrivilege)),
    // ER_BAD_DB_ERROR
    (1049, Some(K::InvalidCatalogName)),
    // too many connections, out of memory, table full
    (1040, Some(K::InsufficientResources)),
    (1037, Some(K::InsufficientResources)),
    (1038, Some(K::InsufficientResources)),
    (1041, Some(K::InsufficientResources)),
    (1114, Some(K::InsufficientResources)),
    // lock wait timeout, deadlock
    (1205, Some(K::TransactionRollback)),
    (1213, Some(K::TransactionRollback)),
    // ER_UNKNOWN_ERROR
    (1105, None),
];

/// Server error number to SQL-state, for clients that do not report it
const STATE_MAP: &[(u16, &str)] = &[
    (1022, "23000"),
    (1037, "HY001"),
    (1038, "HY001"),
    (1040, "08004"),
    (1043, "08S01"),
    (1044, "42000"),
    (1045, "28000"),
    (1046, "3D000"),
    (1047, "08S01"),
    (1048, "23000"),
    (1049, "42000"),
    (1050, "42S01"),
    (1051, "42S02"),
    (1052, "23000"),
    (1053, "08S01"),
    (1054, "42S22"),
    (1055, "42000"),
    (1058, "21S01"),
    (1060, "42S21"),
    (1062, "23000"),
    (1064, "42000"),
    (1080, "08S01"),
    (1081, "08S01"),
    (1109, "42S02"),
    (1136, "21S01"),
    (1138, "22004"),
    (1142, "42000"),
    (1143, "42000"),
    (1146, "42S02"),
    (1149, "42000"),
    (1152, "08S01"),
    (1153, "08S01"),
    (1154, "08S01"),
    (1155, "08S01"),
    (1156, "08S01"),
    (1157, "08S01"),
    (1158, "08S01"),
    (1159, "08S01"),
    (1160, "08S01"),
    (1161, "08S01"),
    (1169, "23000"),
    (1179, "25000"),
    (1184, "08S01"),
    (1207, "25000"),
    (1213, "40001"),
    (1216, "23000"),
    (1217, "23000"),
    (1222, "21000"),
    (1227, "42000"),
    (1241, "21000"),
    (1242, "21000"),
    (1247, "42S22"),
    (1249, "01000"),
    (1251, "08004"),
    (1261, "01000"),
    (1262, "01000"),
    (1263, "22004"),
    (1264, "22003"),
    (1265, "01000"),
    (1292, "22007"),
    (1311, "01000"),
    (1329, "02000"),
    (1365, "22012"),
    (1367, "22007"),
    (1406, "22001"),
    (1416, "22003"),
    (1451, "23000"),
    (1452, "23000"),
    (1557, "23000"),
    (1568, "25001"),
    (1586, "23000"),
    (1792, "25006"),
    (1859, "23000"),
];

/// Classifier for MySQL server and driver errors
#[derive(Debug, Clone)]
pub struct MySqlClassifier {
    codes: HashMap<u16, Option<DbErrorKind>>,
    state_map: HashMap<u16, &'static str>,
    states: SqlStateMap,
}

impl MySqlClassifier {
    /// Create a classifier with the default tables
    #[must_use]
    pub fn new() -> Self {
        Self {
            codes: CODES.iter().copied().collect(),
            state_map: STATE_MAP.iter().copied().collect(),
            states: SqlStateMap::standard(),
        }
    }

    /// Map an error number to `kind`, or to "unclassified" with `None`
    #[must_use]
    pub fn map_code(mut self, number: u16, kind: Option<DbErrorKind>) -> Self {
        self.codes.insert(number, kind);
        self
    }

    /// Map a SQL-state or SQL-state class to `kind`
    #[must_use]
    pub fn map_state(mut self, state: impl Into<String>, kind: Option<DbErrorKind>) -> Self {
        self.states.insert(state, kind);
        self
    }

    fn classify(&self, err: &MySqlError) -> Option<Option<DbErrorKind>> {
        if let Some(mapping) = self.codes.get(&err.number) {
            return Some(*mapping);
        }

        let derived = self
            .state_map
            .get(&err.number)
            .copied()
            .filter(|state| state.len() == 5);

        derived
            .and_then(|state| self.states.resolve(state))
            .or_else(|| {
                err.sql_state
                    .as_deref()
                    .and_then(|state| self.states.resolve(state))
            })
    }
}

impl Default for MySqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for MySqlClassifier {
    fn backend(&self) -> &'static str {
        "mysql"
    }

    fn convert(&self, err: &(dyn StdError + 'static)) -> DbError {
        if let Some(db_err) = classify_common(err) {
            return db_err;
        }

        if let Some(driver) = find_cause::<MySqlDriverError>(err) {
            return driver.kind().new_with_error(err);
        }

        if let Some(my_err) = find_cause::<MySqlError>(err) {
            if let Some(mapping) = self.classify(my_err) {
                return from_mapping(mapping, err);
            }
        }

        unspecified(self.backend(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SqlError;

    fn convert(err: &(dyn StdError + 'static)) -> DbError {
        MySqlClassifier::new().convert(err)
    }

    #[test]
    fn test_duplicate_entry_is_unique_violation() {
        let err = MySqlError::new(1062, "Duplicate entry 'a@b.c' for key 'users.email'");
        let db_err = convert(&err);
        assert!(db_err.is(DbErrorKind::UniqueViolation));
        assert_eq!(db_err.message, err.to_string());
    }

    #[test]
    fn test_exact_codes() {
        let cases = [
            (1452, DbErrorKind::ForeignKeyViolation),
            (1451, DbErrorKind::ForeignKeyViolation),
            (1048, DbErrorKind::NotNullViolation),
            (3819, DbErrorKind::CheckViolation),
            (1045, DbErrorKind::InvalidAuthorization),
            (1142, DbErrorKind::InsufficientPrivilege),
            (1049, DbErrorKind::InvalidCatalogName),
            (1213, DbErrorKind::TransactionRollback),
            (1040, DbErrorKind::InsufficientResources),
        ];
        for (number, kind) in cases {
            assert!(convert(&MySqlError::new(number, "boom")).is(kind), "{}", number);
        }
    }

    #[test]
    fn test_derived_state_class_fallback() {
        // not in the code table, derived state 23000
        assert!(convert(&MySqlError::new(1859, "duplicate"))
            .is(DbErrorKind::IntegrityConstraintViolation));
        // derived state 22003 has no exact entry, class 22 does
        assert!(convert(&MySqlError::new(1264, "out of range")).is(DbErrorKind::DataException));
        // derived state 42S02, class 42
        assert!(convert(&MySqlError::new(1146, "no such table")).is(DbErrorKind::InvalidSyntax));
        // derived state 08S01, class 08
        assert!(convert(&MySqlError::new(1053, "shutdown"))
            .is(DbErrorKind::ConnectionException));
    }

    #[test]
    fn test_native_state_used_when_number_unknown() {
        let err = MySqlError::new(4000, "retry").with_sql_state("40001");
        assert!(convert(&err).is(DbErrorKind::TransactionRollback));
    }

    #[test]
    fn test_derived_state_wins_over_native_state() {
        let err = MySqlError::new(1264, "out of range").with_sql_state("40001");
        assert!(convert(&err).is(DbErrorKind::DataException));
    }

    #[test]
    fn test_explicit_none_code_stops_search() {
        // 1105 maps to None; without that entry the native state would match
        let err = MySqlError::new(1105, "unknown").with_sql_state("23000");
        assert!(convert(&err).is(DbErrorKind::UnspecifiedError));

        let classifier = MySqlClassifier::new().map_code(1062, None);
        assert!(classifier
            .convert(&MySqlError::new(1062, "dup"))
            .is(DbErrorKind::UnspecifiedError));
    }

    #[test]
    fn test_absent_code_continues_search() {
        let err = MySqlError::new(4242, "custom").with_sql_state("23000");
        assert!(convert(&err).is(DbErrorKind::IntegrityConstraintViolation));
    }

    #[test]
    fn test_unknown_number_without_state_is_unspecified() {
        let err = MySqlError::new(4242, "mystery");
        let db_err = convert(&err);
        assert!(db_err.is(DbErrorKind::UnspecifiedError));
        assert_eq!(db_err.message, "Error 4242: mystery");
    }

    #[test]
    fn test_general_error_state_is_unspecified() {
        let err = MySqlError::new(4242, "general").with_sql_state("HY000");
        assert!(convert(&err).is(DbErrorKind::UnspecifiedError));
    }

    #[test]
    fn test_driver_sentinels() {
        assert!(convert(&MySqlDriverError::InvalidConn).is(DbErrorKind::ConnectionException));
        assert!(convert(&MySqlDriverError::NoTls).is(DbErrorKind::ConnectionException));
        assert!(convert(&MySqlDriverError::MalformedPacket).is(DbErrorKind::ConnectionException));
        assert!(convert(&MySqlDriverError::PktTooLarge).is(DbErrorKind::ProgramLimitExceeded));
    }

    #[test]
    fn test_generic_sentinels_take_precedence() {
        assert!(convert(&SqlError::NoRows).is(DbErrorKind::NoResult));
        assert!(convert(&SqlError::ConnDone).is(DbErrorKind::ConnectionException));
    }

    #[test]
    fn test_custom_state_mapping() {
        let classifier = MySqlClassifier::new().map_state("HY", Some(DbErrorKind::SystemError));
        let err = MySqlError::new(4242, "general").with_sql_state("HY000");
        assert!(classifier.convert(&err).is(DbErrorKind::SystemError));
    }

    #[test]
    fn test_native_state_used_after_derived_state_miss() {
        // 1058 derives 21S01; without class 21 the server's own state decides
        let mut states = SqlStateMap::new();
        states.insert("99", Some(DbErrorKind::SystemError));
        let classifier = MySqlClassifier {
            states,
            ..MySqlClassifier::new()
        };

        let err = MySqlError::new(1058, "Column count doesn't match").with_sql_state("99000");
        assert!(classifier.convert(&err).is(DbErrorKind::SystemError));

        let without_state = MySqlError::new(1058, "Column count doesn't match");
        assert!(classifier
            .convert(&without_state)
            .is(DbErrorKind::UnspecifiedError));
    }

    #[test]
    fn test_display() {
        assert_eq!(MySqlError::new(1062, "dup").to_string(), "Error 1062: dup");
        assert_eq!(
            MySqlError::new(1062, "dup").with_sql_state("23000").to_string(),
            "Error 1062 (23000): dup"
        );
    }
}
