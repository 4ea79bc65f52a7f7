//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auditor_provider;
mod entity_repository;
mod lifecycle_hook;

#[cfg(test)]
pub use auditor_provider::MockAuditorProvider;
pub use auditor_provider::AuditorProvider;
pub use entity_repository::{EntityRepository, EntityRepositoryError, ReadScope};
pub use lifecycle_hook::{LifecycleHook, TracingLifecycleHook, WriteKind};
