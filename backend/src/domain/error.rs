//! Domain-level error taxonomy.
//!
//! These errors are transport agnostic. Inbound adapters translate them into
//! the response envelope, choosing the status that belongs to each
//! [`ErrorCode`].
//!
//! Business code raises one of the four named kinds and never catches its own
//! errors. Anything else that escapes a handler travels as
//! [`Fault::Unclassified`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The request is malformed or semantically invalid.
    BadRequest,
    /// Caller identity is missing or invalid.
    Unauthorized,
    /// Caller identity is valid but lacks permission.
    Forbidden,
    /// The referenced resource does not exist or is soft-deleted.
    NotFound,
    /// A fault that matched no known kind.
    InternalError,
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Taxonomy error raised by business code.
///
/// ## Invariants
/// - `code` is never [`ErrorCode::InternalError`]; only the four public
///   constructors create values.
/// - `details` stays `None` unless a caller attaches it explicitly.
///
/// # Examples
/// ```
/// use backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("User 7 not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert!(err.details().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

impl Error {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Malformed or semantically invalid input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Caller identity missing or invalid.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Caller identity valid but lacking permission.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Referenced resource does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Debug payload attached by the raiser, if any.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured debug details to the error.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::bad_request("bad").with_details(json!({ "field": "email" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Any failure leaving request handling.
///
/// The translator matches on the variant: known taxonomy errors keep their
/// own status and message, everything else becomes an internal error.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// A taxonomy error raised deliberately by business code.
    #[error(transparent)]
    Known(#[from] Error),
    /// A fault the application did not originate.
    #[error("{message}")]
    Unclassified { message: String },
}

impl Fault {
    /// Wrap an unexpected failure, keeping only its rendered message.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{ErrorCode, Fault};
    ///
    /// let fault = Fault::unclassified("npe");
    /// assert_eq!(fault.code(), ErrorCode::InternalError);
    /// assert_eq!(fault.to_string(), "npe");
    /// ```
    pub fn unclassified(fault: impl fmt::Display) -> Self {
        Self::Unclassified {
            message: fault.to_string(),
        }
    }

    /// Code of the failure; unclassified faults report
    /// [`ErrorCode::InternalError`].
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Known(error) => error.code(),
            Self::Unclassified { .. } => ErrorCode::InternalError,
        }
    }
}
