//! Shared test doubles for unit and integration tests.

mod clock;
mod state;

pub use clock::{FixtureClock, fixture_timestamp};
pub use state::{in_memory_http_state, in_memory_user_service};
