//! Audit identity resolution.
//!
//! The caller's identity arrives as an explicit [`SecurityContext`] value and
//! is reduced to a single [`Auditor`] string for stamping. Resolution never
//! fails: missing, anonymous, blank or unreadable identities degrade to the
//! `ANONYMOUS` or `SYSTEM` fallbacks so stamping cannot block a write.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::domain::ports::AuditorProvider;

/// Fallback auditor when no authenticated identity is available.
pub const ANONYMOUS_AUDITOR: &str = "ANONYMOUS";
/// Fallback auditor when the identity is unusable or unreadable.
pub const SYSTEM_AUDITOR: &str = "SYSTEM";
/// Principal name the request layer uses for unauthenticated callers.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymousUser";
/// Maximum auditor length, counted in characters.
pub const AUDITOR_MAX_CHARS: usize = 50;

/// Reasons a stored auditor string is rejected on decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditorValidationError {
    /// Empty or whitespace only.
    #[error("auditor must not be blank")]
    Blank,
    /// Longer than the character cap.
    #[error("auditor has {len} characters, at most {AUDITOR_MAX_CHARS} allowed")]
    TooLong { len: usize },
}

/// Identity attributed to a create, update or delete.
///
/// Decoding enforces the same shape [`resolve_auditor`] produces: non-blank
/// and at most [`AUDITOR_MAX_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Auditor(String);

impl TryFrom<String> for Auditor {
    type Error = AuditorValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(AuditorValidationError::Blank);
        }
        let len = value.chars().count();
        if len > AUDITOR_MAX_CHARS {
            return Err(AuditorValidationError::TooLong { len });
        }
        Ok(Self(value))
    }
}

impl From<Auditor> for String {
    fn from(value: Auditor) -> Self {
        value.0
    }
}

impl Auditor {
    /// The `ANONYMOUS` fallback.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_AUDITOR.to_owned())
    }

    /// The `SYSTEM` fallback.
    #[must_use]
    pub fn system() -> Self {
        Self(SYSTEM_AUDITOR.to_owned())
    }

    /// Borrow the auditor string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Auditor {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Auditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication presented by the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    name: Option<String>,
    authenticated: bool,
}

impl Authentication {
    /// An authenticated principal with the given name.
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            authenticated: true,
        }
    }

    /// An authenticated principal that carries no name.
    #[must_use]
    pub fn unnamed() -> Self {
        Self {
            name: None,
            authenticated: true,
        }
    }

    /// A principal the request layer has not authenticated.
    pub fn unauthenticated(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            authenticated: false,
        }
    }

    /// Principal name, if one was supplied.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the request layer vouched for this principal.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Identity context passed explicitly into every mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SecurityContext {
    /// No authentication is attached to the current operation.
    #[default]
    Empty,
    /// Authentication supplied by the request layer.
    Present(Authentication),
    /// The identity source failed while being read.
    Unavailable { reason: String },
}

impl SecurityContext {
    /// Context carrying an authenticated principal.
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self::Present(Authentication::authenticated(name))
    }

    /// Context recording a failure to read the identity source.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

impl From<Authentication> for SecurityContext {
    fn from(value: Authentication) -> Self {
        Self::Present(value)
    }
}

/// Resolve the auditor for `context`.
///
/// # Examples
/// ```
/// use backend::domain::{resolve_auditor, SecurityContext};
///
/// assert_eq!(resolve_auditor(&SecurityContext::Empty).as_str(), "ANONYMOUS");
/// assert_eq!(
///     resolve_auditor(&SecurityContext::authenticated("ada")).as_str(),
///     "ada"
/// );
/// ```
#[must_use]
pub fn resolve_auditor(context: &SecurityContext) -> Auditor {
    let authentication = match context {
        SecurityContext::Empty => {
            debug!("no authenticated user found, using ANONYMOUS");
            return Auditor::anonymous();
        }
        SecurityContext::Unavailable { reason } => {
            error!(%reason, "error retrieving current auditor, falling back to SYSTEM");
            return Auditor::system();
        }
        SecurityContext::Present(authentication) => authentication,
    };

    if !authentication.is_authenticated() {
        debug!("principal is not authenticated, using ANONYMOUS");
        return Auditor::anonymous();
    }

    let Some(name) = authentication.name() else {
        warn!("authentication name is missing, falling back to SYSTEM");
        return Auditor::system();
    };

    if name == ANONYMOUS_PRINCIPAL {
        debug!("anonymous principal detected, using ANONYMOUS");
        return Auditor::anonymous();
    }

    if name.trim().is_empty() {
        warn!("authentication name is blank, falling back to SYSTEM");
        return Auditor::system();
    }

    if name.chars().count() > AUDITOR_MAX_CHARS {
        let truncated: String = name.chars().take(AUDITOR_MAX_CHARS).collect();
        warn!(auditor = %truncated, max = AUDITOR_MAX_CHARS, "auditor name truncated");
        return Auditor(truncated);
    }

    debug!(auditor = name, "resolved current auditor");
    Auditor(name.to_owned())
}

/// [`AuditorProvider`] backed by [`resolve_auditor`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextAuditorProvider;

impl AuditorProvider for ContextAuditorProvider {
    fn current_auditor(&self, context: &SecurityContext) -> Auditor {
        resolve_auditor(context)
    }
}
