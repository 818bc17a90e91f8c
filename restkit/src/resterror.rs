//! REST error taxonomy
//!
//! Application-facing errors returned to API clients. Each [`RestErrorKind`]
//! has one immutable prototype; [`RestErrorKind::new`] hands out a detached
//! copy that can carry a per-occurrence id, a documentation link and
//! diagnostic detail without affecting any other response.
//!
//! Two [`RestError`] values are the same error when their codes match.
//!
//! # Example
//!
//! ```rust
//! use restkit::resterror::RestErrorKind;
//!
//! let mut err = RestErrorKind::InvalidInput.new();
//! err.add_detail_info(["email must be unique"]);
//! err.add_link("https://api.example.com/errors/").unwrap();
//!
//! assert_eq!(err.status, "400");
//! assert_eq!(
//!     err.links.unwrap().about,
//!     "https://api.example.com/errors/INVALID_INPUT"
//! );
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Predefined application-facing error classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestErrorKind {
    /// Unexpected server-side failure
    InternalError,
    /// A dependency is temporarily unavailable
    ServiceUnavailable,
    /// Request body failed validation
    InvalidInput,
    /// A query string parameter is malformed
    InvalidQueryParameter,
    /// Request body is not valid JSON
    InvalidJsonDocument,
    /// Path names an invalid resource
    InvalidResourceName,
    /// Requested resource does not exist
    ResourceNotFound,
    /// Resource with the same identity already exists
    ResourceAlreadyExists,
    /// Caller lacks the required permissions
    InsufficientPermissions,
    /// Credentials are missing or invalid
    InvalidAuthenticationInfo,
    /// A request header has an unsupported value
    UnsupportedHeader,
    /// Requested language is not available
    LanguageNotSupported,
}

impl RestErrorKind {
    /// All kinds, in declaration order
    pub const ALL: [RestErrorKind; 12] = [
        Self::InternalError,
        Self::ServiceUnavailable,
        Self::InvalidInput,
        Self::InvalidQueryParameter,
        Self::InvalidJsonDocument,
        Self::InvalidResourceName,
        Self::ResourceNotFound,
        Self::ResourceAlreadyExists,
        Self::InsufficientPermissions,
        Self::InvalidAuthenticationInfo,
        Self::UnsupportedHeader,
        Self::LanguageNotSupported,
    ];

    /// Stable machine-readable code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidQueryParameter => "INVALID_QUERY_PARAMETER",
            Self::InvalidJsonDocument => "INVALID_JSON_DOCUMENT",
            Self::InvalidResourceName => "INVALID_RESOURCE_NAME",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::InvalidAuthenticationInfo => "INVALID_AUTHENTICATION_INFO",
            Self::UnsupportedHeader => "UNSUPPORTED_HEADER",
            Self::LanguageNotSupported => "LANGUAGE_NOT_SUPPORTED",
        }
    }

    /// Human-readable title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::InternalError => "Internal server error",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::InvalidInput => "One of the request inputs is not valid",
            Self::InvalidQueryParameter => "An invalid value was specified for a query parameter",
            Self::InvalidJsonDocument => "The specified JSON is not syntactically valid",
            Self::InvalidResourceName => "The specified resource name is not valid",
            Self::ResourceNotFound => "The specified resource does not exist",
            Self::ResourceAlreadyExists => "The specified resource already exists",
            Self::InsufficientPermissions => {
                "The account being accessed does not have sufficient permissions to execute this operation"
            }
            Self::InvalidAuthenticationInfo => {
                "The authentication information was not provided in the correct format"
            }
            Self::UnsupportedHeader => "One of the HTTP headers specified in the request is not supported",
            Self::LanguageNotSupported => "The requested language is not supported",
        }
    }

    /// HTTP status
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidInput
            | Self::InvalidQueryParameter
            | Self::InvalidJsonDocument
            | Self::InvalidResourceName => StatusCode::BAD_REQUEST,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::ResourceAlreadyExists => StatusCode::CONFLICT,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::InvalidAuthenticationInfo => StatusCode::UNAUTHORIZED,
            Self::UnsupportedHeader | Self::LanguageNotSupported => StatusCode::NOT_ACCEPTABLE,
        }
    }

    /// Look up a kind by its code
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// The immutable prototype of this kind
    #[must_use]
    pub fn prototype(self) -> &'static RestError {
        &PROTOTYPES[self as usize]
    }

    /// Create a detached instance of this kind
    #[allow(clippy::new_ret_no_self)]
    #[must_use]
    pub fn new(self) -> RestError {
        self.prototype().clone()
    }
}

impl fmt::Display for RestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RestErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s)
            .ok_or_else(|| Error::InvalidMapping(format!("unknown REST error code '{}'", s)))
    }
}

static PROTOTYPES: LazyLock<[RestError; 12]> = LazyLock::new(|| {
    RestErrorKind::ALL.map(|kind| {
        RestError::new(kind.code(), kind.title(), kind.status_code().as_u16())
    })
});

/// Links related to an error occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLinks {
    /// Documentation for this error code
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub about: String,
}

/// Diagnostic detail attached to one error occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Short summary
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Free-text diagnostic lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<String>,
}

/// Application-facing error as serialized into API responses
///
/// Identity is the `code`; `id`, `links` and `detail` are per-occurrence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestError {
    /// Per-occurrence identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Related links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ErrorLinks>,
    /// HTTP status as a decimal string
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// Stable machine-readable code
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Diagnostic detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,
}

impl RestError {
    /// Create an application-defined error
    ///
    /// # Example
    ///
    /// ```rust
    /// use restkit::resterror::RestError;
    ///
    /// let err = RestError::new("QUOTA_EXCEEDED", "Monthly quota exceeded", 429);
    /// assert_eq!(err.status, "429");
    /// ```
    pub fn new(code: impl Into<String>, title: impl Into<String>, status: u16) -> Self {
        Self {
            id: None,
            links: None,
            status: status.to_string(),
            code: code.into(),
            title: title.into(),
            detail: None,
        }
    }

    /// Attach a per-occurrence identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Point `links.about` at `<base>/<code>`
    ///
    /// One trailing slash on `base` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLink`] when `base` is not an absolute URL.
    pub fn add_link(&mut self, base: &str) -> Result<()> {
        let trimmed = base.strip_suffix('/').unwrap_or(base);
        url::Url::parse(trimmed).map_err(|source| Error::InvalidLink {
            base: base.to_string(),
            source,
        })?;
        self.links = Some(ErrorLinks {
            about: format!("{}/{}", trimmed, self.code),
        });
        Ok(())
    }

    /// Append diagnostic lines, creating the detail block if needed
    pub fn add_detail_info<I, S>(&mut self, infos: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detail
            .get_or_insert_with(ErrorDetail::default)
            .info
            .extend(infos.into_iter().map(Into::into));
    }

    /// Set the detail title, creating the detail block if needed
    pub fn set_detail_title(&mut self, title: impl Into<String>) {
        self.detail.get_or_insert_with(ErrorDetail::default).title = title.into();
    }

    /// Same error class as `other`
    #[must_use]
    pub fn compare(&self, other: &RestError) -> bool {
        self.code == other.code
    }

    /// Same error class as `kind`
    #[must_use]
    pub fn is(&self, kind: RestErrorKind) -> bool {
        self.code == kind.code()
    }

    /// The predefined kind with this code, if any
    #[must_use]
    pub fn kind(&self) -> Option<RestErrorKind> {
        RestErrorKind::from_code(&self.code)
    }

    /// Parsed HTTP status; 500 when `status` is not a valid code
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
            .parse::<u16>()
            .ok()
            .and_then(|status| StatusCode::from_u16(status).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl PartialEq for RestError {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl Eq for RestError {}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.title)
    }
}

impl std::error::Error for RestError {}
