//! Port for persisting auditable records.
//!
//! Adapters own identifier generation, audit stamping, the optimistic
//! concurrency check and the default exclusion of soft-deleted records.
//! Deletes never remove rows; they are rewritten into soft deletes.

use async_trait::async_trait;

use crate::domain::{Auditable, Auditor, EntityId, EntityMetadata, Version};

use super::define_port_error;

define_port_error! {
    /// Errors raised by entity repository adapters.
    pub enum EntityRepositoryError {
        /// No record with the identifier is visible in the requested scope.
        NotFound { id: String } => "entity not found: {id}",
        /// Optimistic concurrency check failed.
        VersionMismatch { expected: u64, actual: u64 } =>
            "version mismatch: expected {expected}, found {actual}",
        /// Another stored record already holds the unique key.
        Duplicate { key: String } => "unique key already taken: {key}",
        /// The backing store failed.
        Storage { message: String } => "entity storage failed: {message}",
    }
}

/// Visibility of soft-deleted records for a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadScope {
    /// Hide soft-deleted records.
    #[default]
    Active,
    /// Surface soft-deleted records alongside live ones.
    IncludeDeleted,
}

impl ReadScope {
    /// Whether a record with `metadata` is visible in this scope.
    #[must_use]
    pub fn admits(self, metadata: &EntityMetadata) -> bool {
        match self {
            Self::Active => !metadata.is_deleted(),
            Self::IncludeDeleted => true,
        }
    }
}

/// Storage contract for records of type `E`.
///
/// # Version Semantics
///
/// - Inserted records start at [`Version::INITIAL`].
/// - Every successful write advances the stored version by one.
/// - A write whose expected version differs from the stored one fails with
///   [`EntityRepositoryError::VersionMismatch`] and changes nothing.
///
/// # Uniqueness
///
/// Adapters reject a write whose [`Auditable::unique_key`] is held by another
/// stored record, soft-deleted or not, with
/// [`EntityRepositoryError::Duplicate`]. The check and the store are atomic.
#[async_trait]
pub trait EntityRepository<E: Auditable>: Send + Sync {
    /// Store a new record built from `draft`, stamped for `auditor`.
    async fn insert(&self, draft: E::Draft, auditor: &Auditor) -> Result<E, EntityRepositoryError>;

    /// Fetch a record by identifier.
    ///
    /// Returns `None` when no record exists or the record is hidden by
    /// `scope`.
    async fn find_by_id(
        &self,
        id: &EntityId,
        scope: ReadScope,
    ) -> Result<Option<E>, EntityRepositoryError>;

    /// Fetch every record visible in `scope`.
    async fn find_all(&self, scope: ReadScope) -> Result<Vec<E>, EntityRepositoryError>;

    /// Persist changes to an existing record.
    ///
    /// The record's own version is the expected version. Creation stamps are
    /// taken from storage, never from `entity`.
    async fn update(&self, entity: E, auditor: &Auditor) -> Result<E, EntityRepositoryError>;

    /// Soft-delete a live record.
    ///
    /// Fails with [`EntityRepositoryError::NotFound`] when the record is
    /// missing or already soft-deleted.
    async fn delete(
        &self,
        id: &EntityId,
        expected_version: Version,
        auditor: &Auditor,
    ) -> Result<E, EntityRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::test_support::fixture_timestamp;
    use rstest::rstest;

    fn metadata(deleted: bool) -> EntityMetadata {
        let mut metadata =
            EntityMetadata::created(EntityId::random(), &Auditor::system(), fixture_timestamp());
        if deleted {
            metadata.mark_soft_deleted(Auditor::system(), fixture_timestamp());
        }
        metadata
    }

    #[rstest]
    #[case(ReadScope::Active, false, true)]
    #[case(ReadScope::Active, true, false)]
    #[case(ReadScope::IncludeDeleted, false, true)]
    #[case(ReadScope::IncludeDeleted, true, true)]
    fn scope_filters_soft_deleted_records(
        #[case] scope: ReadScope,
        #[case] deleted: bool,
        #[case] visible: bool,
    ) {
        assert_eq!(scope.admits(&metadata(deleted)), visible);
    }

    #[rstest]
    fn default_scope_hides_deleted_records() {
        assert_eq!(ReadScope::default(), ReadScope::Active);
    }

    #[rstest]
    fn version_mismatch_reports_both_versions() {
        let err = EntityRepositoryError::version_mismatch(2_u64, 3_u64);
        assert_eq!(err.to_string(), "version mismatch: expected 2, found 3");
    }
}
