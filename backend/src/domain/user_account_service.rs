//! User account domain service.
//!
//! Resolves the acting auditor from the caller's [`SecurityContext`], applies
//! validation and maps repository failures onto the error taxonomy. Storage
//! failures are not business errors and leave as [`Fault::Unclassified`].

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::ports::{AuditorProvider, EntityRepository, EntityRepositoryError, ReadScope};
use crate::domain::{
    Auditable, Email, EntityId, Error, Fault, PersonName, SecurityContext, UserAccount,
    UserAccountDraft, UserAccountValidationError, Version,
};

/// Optional profile changes applied at a known version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserProfile {
    pub expected_version: Version,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: Option<bool>,
}

/// Service exposing the user account lifecycle.
#[derive(Clone)]
pub struct UserAccountService {
    repository: Arc<dyn EntityRepository<UserAccount>>,
    auditors: Arc<dyn AuditorProvider>,
}

impl UserAccountService {
    /// Create a service over the given repository and auditor provider.
    pub fn new(
        repository: Arc<dyn EntityRepository<UserAccount>>,
        auditors: Arc<dyn AuditorProvider>,
    ) -> Self {
        Self {
            repository,
            auditors,
        }
    }

    fn map_validation_error(error: UserAccountValidationError) -> Fault {
        Error::bad_request(error.to_string())
            .with_details(json!({
                "field": error.field(),
                "code": error.code(),
            }))
            .into()
    }

    fn map_repository_error(error: EntityRepositoryError) -> Fault {
        match error {
            EntityRepositoryError::NotFound { id } => {
                Error::not_found(format!("User {id} not found")).into()
            }
            EntityRepositoryError::VersionMismatch { expected, actual } => {
                Self::version_conflict(expected, actual)
            }
            EntityRepositoryError::Duplicate { key } => {
                Error::bad_request(format!("username {key} is already taken"))
                    .with_details(json!({ "field": "username", "code": "taken" }))
                    .into()
            }
            EntityRepositoryError::Storage { message } => {
                Fault::unclassified(format!("user account storage failed: {message}"))
            }
        }
    }

    fn version_conflict(expected: u64, actual: u64) -> Fault {
        Error::bad_request("version mismatch")
            .with_details(json!({
                "expectedVersion": expected,
                "actualVersion": actual,
                "code": "version_mismatch",
            }))
            .into()
    }

    fn not_found(id: &EntityId) -> Fault {
        Error::not_found(format!("User {id} not found")).into()
    }

    async fn find(&self, id: &EntityId, scope: ReadScope) -> Result<UserAccount, Fault> {
        self.repository
            .find_by_id(id, scope)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Register a new account.
    ///
    /// Usernames stay reserved by soft-deleted accounts; the repository
    /// enforces this atomically with the insert.
    pub async fn register(
        &self,
        draft: UserAccountDraft,
        context: &SecurityContext,
    ) -> Result<UserAccount, Fault> {
        let auditor = self.auditors.current_auditor(context);
        let account = self
            .repository
            .insert(draft, &auditor)
            .await
            .map_err(Self::map_repository_error)?;
        info!(id = %account.id(), %auditor, "user account registered");
        Ok(account)
    }

    /// Fetch a live account.
    pub async fn get(&self, id: &EntityId) -> Result<UserAccount, Fault> {
        self.find(id, ReadScope::Active).await
    }

    /// List live accounts.
    pub async fn list(&self) -> Result<Vec<UserAccount>, Fault> {
        self.repository
            .find_all(ReadScope::Active)
            .await
            .map_err(Self::map_repository_error)
    }

    /// Apply profile changes to a live account at `changes.expected_version`.
    pub async fn update_profile(
        &self,
        id: &EntityId,
        changes: UpdateUserProfile,
        context: &SecurityContext,
    ) -> Result<UserAccount, Fault> {
        let mut account = self.get(id).await?;
        if account.version() != changes.expected_version {
            return Err(Self::version_conflict(
                changes.expected_version.get(),
                account.version().get(),
            ));
        }

        let UpdateUserProfile {
            email,
            first_name,
            last_name,
            enabled,
            ..
        } = changes;
        if let Some(email) = email {
            account.set_email(Email::new(email).map_err(Self::map_validation_error)?);
        }
        if let Some(first_name) = first_name {
            account.set_first_name(
                PersonName::first(first_name).map_err(Self::map_validation_error)?,
            );
        }
        if let Some(last_name) = last_name {
            account
                .set_last_name(PersonName::last(last_name).map_err(Self::map_validation_error)?);
        }
        if let Some(enabled) = enabled {
            account.set_enabled(enabled);
        }

        let auditor = self.auditors.current_auditor(context);
        self.repository
            .update(account, &auditor)
            .await
            .map_err(Self::map_repository_error)
    }

    /// Soft-delete a live account at `expected_version`.
    pub async fn delete(
        &self,
        id: &EntityId,
        expected_version: Version,
        context: &SecurityContext,
    ) -> Result<UserAccount, Fault> {
        let auditor = self.auditors.current_auditor(context);
        let account = self
            .repository
            .delete(id, expected_version, &auditor)
            .await
            .map_err(Self::map_repository_error)?;
        info!(%id, %auditor, "user account soft-deleted");
        Ok(account)
    }

    /// Restore a soft-deleted account. Live accounts are returned unchanged.
    pub async fn restore(
        &self,
        id: &EntityId,
        context: &SecurityContext,
    ) -> Result<UserAccount, Fault> {
        let mut account = self.find(id, ReadScope::IncludeDeleted).await?;
        if !account.is_soft_deleted() {
            return Ok(account);
        }

        account.restore();
        let auditor = self.auditors.current_auditor(context);
        let restored = self
            .repository
            .update(account, &auditor)
            .await
            .map_err(Self::map_repository_error)?;
        info!(%id, %auditor, "user account restored");
        Ok(restored)
    }
}

/// Validation failures surface as bad requests carrying `{field, code}`.
impl From<UserAccountValidationError> for Fault {
    fn from(value: UserAccountValidationError) -> Self {
        UserAccountService::map_validation_error(value)
    }
}

#[cfg(test)]
#[path = "user_account_service_tests.rs"]
mod tests;
