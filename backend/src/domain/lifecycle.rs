//! Lifecycle contract shared by every persisted record.
//!
//! Records compose an [`EntityMetadata`] value and implement [`Auditable`]
//! instead of inheriting from a base type. The metadata owns identity, audit
//! stamps, the soft-delete marker and the optimistic-concurrency version.
//!
//! ## Invariants
//! - `created_at` and `created_by` are fixed at creation.
//! - The soft-delete marker is set or cleared as a whole; a partial marker is
//!   unrepresentable and rejected on deserialisation.
//! - `version` is advanced only by persistence adapters inside this crate.
//! - Equality and hashing consider `id` alone.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Auditor;

/// Globally unique record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Optimistic-concurrency counter.
///
/// Callers may build a `Version` to state what they expect; only persistence
/// adapters advance the version stored on a record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version assigned to a freshly inserted record.
    pub const INITIAL: Self = Self(0);

    /// Wrap a raw version number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw version number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When and by whom a record was soft-deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftDeletion {
    at: DateTime<Utc>,
    by: Auditor,
}

impl SoftDeletion {
    /// Deletion timestamp.
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Auditor who deleted the record.
    #[must_use]
    pub fn by(&self) -> &Auditor {
        &self.by
    }
}

/// Validation errors raised when rehydrating [`EntityMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityMetadataValidationError {
    #[error("soft-delete marker must set isDeleted, softDeletedAt and softDeletedBy together")]
    PartialSoftDeletion,
    #[error("updatedAt must not precede createdAt")]
    UpdatedBeforeCreated,
}

/// Identity, audit and concurrency fields shared by every record.
///
/// The soft-delete marker only changes through [`Auditable::soft_delete`],
/// [`Auditable::restore`] and repository deletes:
///
/// ```compile_fail
/// use backend::domain::EntityMetadata;
///
/// fn revive(metadata: &mut EntityMetadata) {
///     metadata.clear_soft_deletion();
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "EntityMetadataDto", into = "EntityMetadataDto")]
pub struct EntityMetadata {
    id: EntityId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Auditor,
    updated_by: Auditor,
    deletion: Option<SoftDeletion>,
    version: Version,
}

impl EntityMetadata {
    /// Pre-create stamp: both timestamps and both auditors take the creation
    /// values.
    pub(crate) fn created(id: EntityId, auditor: &Auditor, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
            created_by: auditor.clone(),
            updated_by: auditor.clone(),
            deletion: None,
            version: Version::INITIAL,
        }
    }

    /// Record identifier.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the last successful write.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Auditor stamped at creation.
    #[must_use]
    pub fn created_by(&self) -> &Auditor {
        &self.created_by
    }

    /// Auditor stamped at the last successful write.
    #[must_use]
    pub fn updated_by(&self) -> &Auditor {
        &self.updated_by
    }

    /// Soft-delete marker, if set.
    #[must_use]
    pub fn deletion(&self) -> Option<&SoftDeletion> {
        self.deletion.as_ref()
    }

    /// Whether the record is soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deletion.is_some()
    }

    /// Deletion timestamp, if soft-deleted.
    #[must_use]
    pub fn soft_deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deletion.as_ref().map(SoftDeletion::at)
    }

    /// Deleting auditor, if soft-deleted.
    #[must_use]
    pub fn soft_deleted_by(&self) -> Option<&Auditor> {
        self.deletion.as_ref().map(SoftDeletion::by)
    }

    /// Version the record was read at.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Set the soft-delete marker, overwriting any previous one.
    pub(crate) fn mark_soft_deleted(&mut self, by: Auditor, at: DateTime<Utc>) {
        self.deletion = Some(SoftDeletion { at, by });
    }

    /// Clear the soft-delete marker.
    pub(crate) fn clear_soft_deletion(&mut self) {
        self.deletion = None;
    }

    /// Pre-update stamp.
    pub(crate) fn stamp_update(&mut self, auditor: &Auditor, now: DateTime<Utc>) {
        self.updated_at = now;
        self.updated_by = auditor.clone();
    }

    /// Restore the creation stamp from the stored copy so a write can never
    /// rewrite it.
    pub(crate) fn retain_creation(&mut self, stored: &Self) {
        self.created_at = stored.created_at;
        self.created_by = stored.created_by.clone();
    }

    pub(crate) fn advance_version(&mut self) {
        self.version = self.version.next();
    }
}

impl PartialEq for EntityMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityMetadata {}

impl Hash for EntityMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityMetadataDto {
    id: EntityId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Auditor,
    updated_by: Auditor,
    is_deleted: bool,
    #[serde(default)]
    soft_deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    soft_deleted_by: Option<Auditor>,
    version: Version,
}

impl From<EntityMetadata> for EntityMetadataDto {
    fn from(value: EntityMetadata) -> Self {
        let (soft_deleted_at, soft_deleted_by) = match value.deletion {
            Some(SoftDeletion { at, by }) => (Some(at), Some(by)),
            None => (None, None),
        };
        Self {
            id: value.id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            created_by: value.created_by,
            updated_by: value.updated_by,
            is_deleted: soft_deleted_at.is_some(),
            soft_deleted_at,
            soft_deleted_by,
            version: value.version,
        }
    }
}

impl TryFrom<EntityMetadataDto> for EntityMetadata {
    type Error = EntityMetadataValidationError;

    fn try_from(value: EntityMetadataDto) -> Result<Self, Self::Error> {
        let EntityMetadataDto {
            id,
            created_at,
            updated_at,
            created_by,
            updated_by,
            is_deleted,
            soft_deleted_at,
            soft_deleted_by,
            version,
        } = value;

        let deletion = match (is_deleted, soft_deleted_at, soft_deleted_by) {
            (true, Some(at), Some(by)) => Some(SoftDeletion { at, by }),
            (false, None, None) => None,
            _ => return Err(EntityMetadataValidationError::PartialSoftDeletion),
        };
        if updated_at < created_at {
            return Err(EntityMetadataValidationError::UpdatedBeforeCreated);
        }

        Ok(Self {
            id,
            created_at,
            updated_at,
            created_by,
            updated_by,
            deletion,
            version,
        })
    }
}

/// Capability set every persisted record provides.
///
/// Implementors expose their composed [`EntityMetadata`]; the lifecycle
/// operations are provided on top of it.
pub trait Auditable: Clone + Send + Sync + 'static {
    /// Caller-supplied fields of a record that has not been persisted yet.
    type Draft: Send + 'static;

    /// Name used in logs.
    const ENTITY_NAME: &'static str;

    /// Assemble a record from its draft and freshly stamped metadata.
    fn from_draft(draft: Self::Draft, metadata: EntityMetadata) -> Self;

    /// Shared lifecycle fields.
    fn metadata(&self) -> &EntityMetadata;

    /// Mutable access to the shared lifecycle fields.
    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Natural key that must be unique across all stored records of this
    /// type, soft-deleted ones included. `None` when the type has no such key.
    fn unique_key(&self) -> Option<&str> {
        None
    }

    /// Record identifier.
    fn id(&self) -> EntityId {
        self.metadata().id()
    }

    /// Version the record was read at.
    fn version(&self) -> Version {
        self.metadata().version()
    }

    /// Mark the record as soft-deleted by `by` at the clock's current time.
    ///
    /// Calling this twice overwrites the timestamp and auditor; check
    /// [`Auditable::is_soft_deleted`] first when that matters.
    fn soft_delete(&mut self, by: Auditor, clock: &dyn Clock) {
        self.metadata_mut().mark_soft_deleted(by, clock.utc());
    }

    /// Clear the soft-delete marker. No-op on a live record.
    fn restore(&mut self) {
        self.metadata_mut().clear_soft_deletion();
    }

    /// Whether the record is soft-deleted.
    fn is_soft_deleted(&self) -> bool {
        self.metadata().is_deleted()
    }
}

/// Implement identity equality (`PartialEq`, `Eq`, `Hash`) for an
/// [`Auditable`] record.
macro_rules! impl_entity_identity {
    ($ty:ty) => {
        impl ::std::cmp::PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::domain::Auditable::id(self) == $crate::domain::Auditable::id(other)
            }
        }

        impl ::std::cmp::Eq for $ty {}

        impl ::std::hash::Hash for $ty {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                ::std::hash::Hash::hash(&$crate::domain::Auditable::id(self), state);
            }
        }
    };
}

pub(crate) use impl_entity_identity;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::AUDITOR_MAX_CHARS;
    use crate::test_support::{FixtureClock, fixture_timestamp};
    use chrono::Duration;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[derive(Debug, Clone)]
    struct Widget {
        metadata: EntityMetadata,
        label: String,
    }

    impl Auditable for Widget {
        type Draft = String;
        const ENTITY_NAME: &'static str = "Widget";

        fn from_draft(draft: Self::Draft, metadata: EntityMetadata) -> Self {
            Self {
                metadata,
                label: draft,
            }
        }

        fn metadata(&self) -> &EntityMetadata {
            &self.metadata
        }

        fn metadata_mut(&mut self) -> &mut EntityMetadata {
            &mut self.metadata
        }
    }

    impl_entity_identity!(Widget);

    fn auditor(name: &str) -> Auditor {
        crate::domain::resolve_auditor(&crate::domain::SecurityContext::authenticated(name))
    }

    #[fixture]
    fn widget() -> Widget {
        let metadata =
            EntityMetadata::created(EntityId::random(), &auditor("ada"), fixture_timestamp());
        Widget::from_draft("gear".to_owned(), metadata)
    }

    #[rstest]
    fn creation_stamps_both_auditors_and_timestamps(widget: Widget) {
        let metadata = widget.metadata();
        assert_eq!(metadata.created_at(), fixture_timestamp());
        assert_eq!(metadata.updated_at(), fixture_timestamp());
        assert_eq!(metadata.created_by().as_str(), "ada");
        assert_eq!(metadata.updated_by().as_str(), "ada");
        assert_eq!(metadata.version(), Version::INITIAL);
        assert!(!widget.is_soft_deleted());
    }

    #[rstest]
    fn soft_delete_then_restore_round_trips_marker(mut widget: Widget) {
        let clock = FixtureClock::at(fixture_timestamp() + Duration::hours(1));
        widget.soft_delete(auditor("grace"), &clock);

        assert!(widget.is_soft_deleted());
        assert_eq!(
            widget.metadata().soft_deleted_at(),
            Some(fixture_timestamp() + Duration::hours(1))
        );
        assert_eq!(
            widget.metadata().soft_deleted_by().map(Auditor::as_str),
            Some("grace")
        );

        widget.restore();
        assert!(!widget.is_soft_deleted());
        assert!(widget.metadata().soft_deleted_at().is_none());
        assert!(widget.metadata().soft_deleted_by().is_none());
    }

    #[rstest]
    fn repeated_soft_delete_overwrites_marker(mut widget: Widget) {
        widget.soft_delete(auditor("ada"), &FixtureClock::at(fixture_timestamp()));
        let later = fixture_timestamp() + Duration::minutes(5);
        widget.soft_delete(auditor("grace"), &FixtureClock::at(later));

        assert!(widget.is_soft_deleted());
        assert_eq!(widget.metadata().soft_deleted_at(), Some(later));
        assert_eq!(
            widget.metadata().soft_deleted_by().map(Auditor::as_str),
            Some("grace")
        );
    }

    #[rstest]
    fn restore_on_live_record_is_noop(mut widget: Widget) {
        let before = widget.metadata().clone();
        widget.restore();

        assert!(!widget.is_soft_deleted());
        assert!(widget.metadata().deletion().is_none());
        assert_eq!(widget.metadata().updated_at(), before.updated_at());
        assert_eq!(widget.version(), before.version());
    }

    #[rstest]
    fn lifecycle_operations_leave_version_untouched(mut widget: Widget) {
        widget.soft_delete(auditor("ada"), &FixtureClock::at(fixture_timestamp()));
        widget.restore();
        assert_eq!(widget.version(), Version::INITIAL);
    }

    #[rstest]
    fn equality_depends_only_on_id(widget: Widget) {
        let mut twin = widget.clone();
        twin.label = "sprocket".to_owned();
        twin.soft_delete(auditor("grace"), &FixtureClock::at(fixture_timestamp()));
        assert_eq!(widget, twin);

        let mut stranger = widget.clone();
        stranger.metadata.id = EntityId::random();
        assert_ne!(widget, stranger);
    }

    #[rstest]
    fn hashing_follows_identity(widget: Widget) {
        use std::collections::HashSet;

        let mut twin = widget.clone();
        twin.label = "other".to_owned();
        let set: HashSet<Widget> = [widget, twin].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    fn metadata_serialises_marker_triple(mut widget: Widget) {
        let live = serde_json::to_value(widget.metadata()).expect("metadata serialises");
        assert_eq!(live.get("isDeleted"), Some(&json!(false)));
        assert_eq!(live.get("softDeletedAt"), Some(&Value::Null));
        assert_eq!(live.get("softDeletedBy"), Some(&Value::Null));
        assert_eq!(live.get("version"), Some(&json!(0)));
        assert_eq!(live.get("createdBy"), Some(&json!("ada")));

        widget.soft_delete(auditor("grace"), &FixtureClock::at(fixture_timestamp()));
        let deleted = serde_json::to_value(widget.metadata()).expect("metadata serialises");
        assert_eq!(deleted.get("isDeleted"), Some(&json!(true)));
        assert_eq!(deleted.get("softDeletedBy"), Some(&json!("grace")));
        assert!(deleted.get("softDeletedAt").is_some_and(Value::is_string));
    }

    #[rstest]
    fn metadata_round_trips_through_dto(mut widget: Widget) {
        widget.soft_delete(auditor("grace"), &FixtureClock::at(fixture_timestamp()));
        let value = serde_json::to_value(widget.metadata()).expect("metadata serialises");
        let decoded: EntityMetadata = serde_json::from_value(value).expect("metadata decodes");

        assert_eq!(decoded.id(), widget.id());
        assert_eq!(decoded.soft_deleted_by().map(Auditor::as_str), Some("grace"));
        assert_eq!(decoded.created_at(), widget.metadata().created_at());
    }

    #[rstest]
    #[case(json!(true), Value::Null, json!("grace"))]
    #[case(json!(true), json!("2026-02-24T10:30:00Z"), Value::Null)]
    #[case(json!(false), json!("2026-02-24T10:30:00Z"), json!("grace"))]
    fn partial_markers_are_rejected(
        widget: Widget,
        #[case] is_deleted: Value,
        #[case] at: Value,
        #[case] by: Value,
    ) {
        let mut value = serde_json::to_value(widget.metadata()).expect("metadata serialises");
        value["isDeleted"] = is_deleted;
        value["softDeletedAt"] = at;
        value["softDeletedBy"] = by;

        let error = serde_json::from_value::<EntityMetadata>(value)
            .expect_err("partial marker must be rejected");
        assert!(error.to_string().contains("soft-delete marker"));
    }

    #[rstest]
    #[case("createdBy", json!("x".repeat(AUDITOR_MAX_CHARS + 1)))]
    #[case("updatedBy", json!("   "))]
    fn unresolvable_auditors_are_rejected(
        widget: Widget,
        #[case] field: &str,
        #[case] auditor: Value,
    ) {
        let mut value = serde_json::to_value(widget.metadata()).expect("metadata serialises");
        value[field] = auditor;

        let result = serde_json::from_value::<EntityMetadata>(value);
        assert!(result.is_err());
    }

    #[rstest]
    fn updated_before_created_is_rejected(widget: Widget) {
        let mut value = serde_json::to_value(widget.metadata()).expect("metadata serialises");
        value["updatedAt"] = json!("2000-01-01T00:00:00Z");

        let result = serde_json::from_value::<EntityMetadata>(value);
        assert!(result.is_err());
    }

    #[rstest]
    fn update_stamp_preserves_creation(mut widget: Widget) {
        let stored = widget.metadata().clone();
        let later = fixture_timestamp() + Duration::days(1);
        widget.metadata_mut().created_by = auditor("mallory");
        widget.metadata_mut().retain_creation(&stored);
        widget.metadata_mut().stamp_update(&auditor("grace"), later);
        widget.metadata_mut().advance_version();

        let metadata = widget.metadata();
        assert_eq!(metadata.created_by().as_str(), "ada");
        assert_eq!(metadata.created_at(), fixture_timestamp());
        assert_eq!(metadata.updated_by().as_str(), "grace");
        assert_eq!(metadata.updated_at(), later);
        assert_eq!(metadata.version(), Version::new(1));
    }
}
