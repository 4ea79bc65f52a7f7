//! Port resolving the auditor stamped on writes.

use crate::domain::{Auditor, SecurityContext};

/// Resolve "who is acting now" from an explicitly passed context.
///
/// Implementations must not fail: every unusable context degrades to a
/// fallback auditor.
#[cfg_attr(test, mockall::automock)]
pub trait AuditorProvider: Send + Sync {
    /// Auditor for the operation carrying `context`.
    fn current_auditor(&self, context: &SecurityContext) -> Auditor;
}
