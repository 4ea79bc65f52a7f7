//! In-memory service wiring for handler and integration tests.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::TracingLifecycleHook;
use crate::domain::{ContextAuditorProvider, UserAccount, UserAccountService};
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::InMemoryEntityRepository;

use super::FixtureClock;

/// User account service over a fresh in-memory repository.
pub fn in_memory_user_service(clock: Arc<dyn Clock>) -> UserAccountService {
    let repository = InMemoryEntityRepository::<UserAccount>::new(clock)
        .with_hook(Arc::new(TracingLifecycleHook));
    UserAccountService::new(Arc::new(repository), Arc::new(ContextAuditorProvider))
}

/// HTTP state backed by an in-memory repository and a fixture clock.
pub fn in_memory_http_state() -> HttpState {
    HttpState::new(Arc::new(in_memory_user_service(Arc::new(
        FixtureClock::default(),
    ))))
}
