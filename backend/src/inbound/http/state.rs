//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::UserAccountService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<UserAccountService>,
}

impl HttpState {
    /// Construct state from the user account service.
    pub fn new(users: Arc<UserAccountService>) -> Self {
        Self { users }
    }
}
