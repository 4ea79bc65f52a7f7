//! In-memory [`EntityRepository`] adapter.
//!
//! Records live in a map guarded by a read-write lock. Every write holds the
//! write lock across the uniqueness and version checks, stamping and store so
//! the compare-and-increment is atomic. Registered lifecycle hooks run around each
//! write; `before_write` sees the stamped record while the lock is held and
//! `after_write` runs once it is released.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    EntityRepository, EntityRepositoryError, LifecycleHook, ReadScope, WriteKind,
};
use crate::domain::{Auditable, Auditor, EntityId, EntityMetadata, Version};

/// Map-backed repository for records of type `E`.
pub struct InMemoryEntityRepository<E: Auditable> {
    records: RwLock<BTreeMap<EntityId, E>>,
    clock: Arc<dyn Clock>,
    hooks: Vec<Arc<dyn LifecycleHook<E>>>,
}

impl<E: Auditable> InMemoryEntityRepository<E> {
    /// Create an empty repository stamping times from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            clock,
            hooks: Vec::new(),
        }
    }

    /// Register a lifecycle hook. Hooks run in registration order.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn LifecycleHook<E>>) -> Self {
        self.hooks.push(hook);
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<EntityId, E>>, EntityRepositoryError> {
        self.records
            .read()
            .map_err(|_| EntityRepositoryError::storage("record lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<EntityId, E>>, EntityRepositoryError> {
        self.records
            .write()
            .map_err(|_| EntityRepositoryError::storage("record lock poisoned"))
    }

    fn before_write(&self, kind: WriteKind, entity: &E) {
        for hook in &self.hooks {
            hook.before_write(kind, entity);
        }
    }

    fn after_write(&self, kind: WriteKind, entity: &E) {
        for hook in &self.hooks {
            hook.after_write(kind, entity);
        }
    }

    fn check_unique(
        records: &BTreeMap<EntityId, E>,
        candidate: &E,
    ) -> Result<(), EntityRepositoryError> {
        let Some(key) = candidate.unique_key() else {
            return Ok(());
        };
        let taken = records
            .values()
            .any(|stored| stored.id() != candidate.id() && stored.unique_key() == Some(key));
        if taken {
            Err(EntityRepositoryError::duplicate(key))
        } else {
            Ok(())
        }
    }

    fn check_version(expected: Version, stored: &E) -> Result<(), EntityRepositoryError> {
        let actual = stored.version();
        if expected == actual {
            Ok(())
        } else {
            Err(EntityRepositoryError::version_mismatch(
                expected.get(),
                actual.get(),
            ))
        }
    }
}

#[async_trait]
impl<E: Auditable> EntityRepository<E> for InMemoryEntityRepository<E> {
    async fn insert(&self, draft: E::Draft, auditor: &Auditor) -> Result<E, EntityRepositoryError> {
        let entity = {
            let mut records = self.write()?;
            let mut id = EntityId::random();
            while records.contains_key(&id) {
                id = EntityId::random();
            }
            let entity = E::from_draft(draft, EntityMetadata::created(id, auditor, self.clock.utc()));
            Self::check_unique(&records, &entity)?;
            self.before_write(WriteKind::Create, &entity);
            records.insert(id, entity.clone());
            entity
        };
        self.after_write(WriteKind::Create, &entity);
        Ok(entity)
    }

    async fn find_by_id(
        &self,
        id: &EntityId,
        scope: ReadScope,
    ) -> Result<Option<E>, EntityRepositoryError> {
        let records = self.read()?;
        Ok(records
            .get(id)
            .filter(|entity| scope.admits(entity.metadata()))
            .cloned())
    }

    async fn find_all(&self, scope: ReadScope) -> Result<Vec<E>, EntityRepositoryError> {
        let records = self.read()?;
        Ok(records
            .values()
            .filter(|entity| scope.admits(entity.metadata()))
            .cloned()
            .collect())
    }

    async fn update(&self, mut entity: E, auditor: &Auditor) -> Result<E, EntityRepositoryError> {
        let id = entity.id();
        let stored_entity = {
            let mut records = self.write()?;
            let stored = records
                .get(&id)
                .ok_or_else(|| EntityRepositoryError::not_found(id.to_string()))?;
            Self::check_version(entity.version(), stored)?;
            Self::check_unique(&records, &entity)?;

            let metadata = entity.metadata_mut();
            metadata.retain_creation(stored.metadata());
            metadata.stamp_update(auditor, self.clock.utc());
            metadata.advance_version();
            self.before_write(WriteKind::Update, &entity);
            records.insert(id, entity.clone());
            entity
        };
        self.after_write(WriteKind::Update, &stored_entity);
        Ok(stored_entity)
    }

    async fn delete(
        &self,
        id: &EntityId,
        expected_version: Version,
        auditor: &Auditor,
    ) -> Result<E, EntityRepositoryError> {
        let deleted = {
            let mut records = self.write()?;
            let entity = records
                .get_mut(id)
                .filter(|entity| !entity.is_soft_deleted())
                .ok_or_else(|| EntityRepositoryError::not_found(id.to_string()))?;
            Self::check_version(expected_version, entity)?;

            let now = self.clock.utc();
            let mut candidate = entity.clone();
            let metadata = candidate.metadata_mut();
            metadata.mark_soft_deleted(auditor.clone(), now);
            metadata.stamp_update(auditor, now);
            metadata.advance_version();
            self.before_write(WriteKind::SoftDelete, &candidate);
            *entity = candidate.clone();
            candidate
        };
        self.after_write(WriteKind::SoftDelete, &deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "in_memory_entity_repository_tests.rs"]
mod tests;
