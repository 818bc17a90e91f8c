//! Error types for the toolkit itself
//!
//! These are the errors returned by the toolkit's own operations: resolving
//! a database error to its prototype, dispatching it to a REST error,
//! building links and loading configuration. They are distinct from the
//! database and REST error *values* the toolkit classifies and produces.

use thiserror::Error;

use crate::dberror::DbErrorKind;

/// Result type alias using the toolkit error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the toolkit
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// A database error value whose identity matches no known prototype
    #[error("Unrecognized database error prototype (id {id})")]
    UnrecognizedPrototype {
        /// The identity carried by the rejected value
        id: u16,
    },

    /// The dispatcher table holds no entry for this kind
    #[error("Database error kind '{kind}' unrecognised by handler")]
    Unmapped {
        /// The kind that had no entry
        kind: DbErrorKind,
    },

    /// The base URL passed to `RestError::add_link` did not parse
    #[error("Invalid link base '{base}': {source}")]
    InvalidLink {
        /// The base URL as given
        base: String,
        /// Parser failure
        #[source]
        source: url::ParseError,
    },

    /// A configured mapping names an unknown database kind or REST code
    #[error("Invalid error mapping: {0}")]
    InvalidMapping(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_prototype_display() {
        let err = Error::UnrecognizedPrototype { id: 999 };
        assert_eq!(
            err.to_string(),
            "Unrecognized database error prototype (id 999)"
        );
    }

    #[test]
    fn test_unmapped_display_uses_kind_name() {
        let err = Error::Unmapped {
            kind: DbErrorKind::UniqueViolation,
        };
        assert!(err.to_string().contains("unique_violation"));
    }

    #[test]
    fn test_invalid_link_keeps_source() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = Error::InvalidLink {
            base: "not a url".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_from_figment_error() {
        let err: Error = figment::Error::from("bad value".to_string()).into();
        assert!(matches!(err, Error::Config(_)));
    }
}
