//! Pre- and post-write callbacks registered per record type.
//!
//! Persistence adapters invoke every registered hook around each write. Hooks
//! observe the record as it is about to be stored (with stamps applied) and as
//! it was stored.

use std::fmt;

use tracing::debug;

use crate::domain::Auditable;

/// Kind of write a hook is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// First insert of a record.
    Create,
    /// Any later write, including restores.
    Update,
    /// A delete rewritten into a soft delete.
    SoftDelete,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::SoftDelete => "soft delete",
        })
    }
}

/// Callback pair run around persistence writes for records of type `E`.
pub trait LifecycleHook<E>: Send + Sync {
    /// Called once stamps are applied, before the record is stored.
    fn before_write(&self, kind: WriteKind, entity: &E) {
        let _ = (kind, entity);
    }

    /// Called after the record is stored.
    fn after_write(&self, kind: WriteKind, entity: &E) {
        let _ = (kind, entity);
    }
}

/// Hook logging every write at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLifecycleHook;

impl<E: Auditable> LifecycleHook<E> for TracingLifecycleHook {
    fn before_write(&self, kind: WriteKind, entity: &E) {
        debug!(
            entity = E::ENTITY_NAME,
            id = %entity.id(),
            version = %entity.version(),
            "before {kind}"
        );
    }

    fn after_write(&self, kind: WriteKind, entity: &E) {
        debug!(
            entity = E::ENTITY_NAME,
            id = %entity.id(),
            version = %entity.version(),
            "after {kind}"
        );
    }
}
