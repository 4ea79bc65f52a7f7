//! Backend library modules.
//!
//! The reusable core is the auditable entity lifecycle in [`domain`] and the
//! error-to-envelope translation in [`inbound::http`].

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::RequestScope;
