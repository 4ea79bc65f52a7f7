//! Domain primitives, lifecycle contract and services.
//!
//! Purpose: Define the auditable record contract shared by every persisted
//! type, the error taxonomy raised by business code and the sample user
//! account aggregate built on both. Types here are transport agnostic.
//!
//! Public surface:
//! - Auditor / SecurityContext / resolve_auditor — audit identity resolution.
//! - Auditable / EntityMetadata / EntityId / Version — lifecycle contract.
//! - Error / ErrorCode / Fault — error taxonomy and boundary fault value.
//! - UserAccount / UserAccountService — sample aggregate and its service.

pub mod auditor;
pub mod error;
pub mod lifecycle;
pub mod ports;
pub mod user_account;
pub mod user_account_service;

pub use self::auditor::{
    ANONYMOUS_AUDITOR, ANONYMOUS_PRINCIPAL, AUDITOR_MAX_CHARS, Authentication, Auditor,
    AuditorValidationError, ContextAuditorProvider, SYSTEM_AUDITOR, SecurityContext, resolve_auditor,
};
pub use self::error::{Error, ErrorCode, Fault};
pub use self::lifecycle::{
    Auditable, EntityId, EntityMetadata, EntityMetadataValidationError, SoftDeletion, Version,
};
pub(crate) use self::lifecycle::impl_entity_identity;
pub use self::user_account::{
    Email, PersonName, UserAccount, UserAccountDraft, UserAccountValidationError, UserRole,
    Username,
};
pub use self::user_account_service::{UpdateUserProfile, UserAccountService};
