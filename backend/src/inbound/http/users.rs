//! User account API handlers.
//!
//! ```text
//! POST   /api/v1/users {"email":"ada@example.com","username":"ada","firstName":"Ada","lastName":"Lovelace"}
//! GET    /api/v1/users
//! GET    /api/v1/users/{id}
//! PATCH  /api/v1/users/{id} {"expectedVersion":0,"firstName":"Augusta"}
//! DELETE /api/v1/users/{id}?expectedVersion=1
//! POST   /api/v1/users/{id}/restore
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Auditable, EntityId, EntityMetadata, UpdateUserProfile, UserAccount, UserAccountDraft,
    UserAccountValidationError, UserRole, Version,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::ApiResponse;
use crate::inbound::http::identity::CallerContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl TryFrom<RegisterUserRequest> for UserAccountDraft {
    type Error = UserAccountValidationError;

    fn try_from(value: RegisterUserRequest) -> Result<Self, Self::Error> {
        let draft = Self::try_new(
            value.email,
            value.username,
            value.first_name,
            value.last_name,
        )?;
        Ok(draft.with_role(value.role.unwrap_or_default()))
    }
}

/// Request body for `PATCH /api/v1/users/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub expected_version: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl From<UpdateUserRequest> for UpdateUserProfile {
    fn from(value: UpdateUserRequest) -> Self {
        Self {
            expected_version: Version::new(value.expected_version),
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            enabled: value.enabled,
        }
    }
}

/// Query string for `DELETE /api/v1/users/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserQuery {
    pub expected_version: u64,
}

/// User account as exposed over HTTP, lifecycle fields inlined.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountResponse {
    #[serde(flatten)]
    pub metadata: EntityMetadata,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
}

impl From<UserAccount> for UserAccountResponse {
    fn from(value: UserAccount) -> Self {
        Self {
            metadata: value.metadata().clone(),
            email: value.email().to_string(),
            username: value.username().to_string(),
            role: value.role(),
            first_name: value.first_name().to_string(),
            last_name: value.last_name().to_string(),
            enabled: value.is_enabled(),
        }
    }
}

type UserEnvelope = ApiResponse<UserAccountResponse>;

fn user_envelope(
    status: StatusCode,
    message: &str,
    account: UserAccount,
    req: &HttpRequest,
) -> UserEnvelope {
    ApiResponse::with_status(status)
        .message(message)
        .request(req)
        .payload(UserAccountResponse::from(account))
        .build()
}

/// Register a new account.
#[post("/users")]
pub async fn register_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    req: HttpRequest,
    payload: web::Json<RegisterUserRequest>,
) -> ApiResult<UserEnvelope> {
    let draft = UserAccountDraft::try_from(payload.into_inner())?;
    let account = state.users.register(draft, caller.security()).await?;
    Ok(user_envelope(
        StatusCode::CREATED,
        "User registered",
        account,
        &req,
    ))
}

/// List live accounts.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::inbound::http::users::list_users;
///
/// let app = App::new().service(list_users);
/// ```
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    req: HttpRequest,
) -> ApiResult<ApiResponse<Vec<UserAccountResponse>>> {
    let accounts = state.users.list().await?;
    let payload: Vec<_> = accounts
        .into_iter()
        .map(UserAccountResponse::from)
        .collect();
    Ok(ApiResponse::success()
        .message("Users retrieved")
        .request(&req)
        .payload(payload)
        .build())
}

/// Fetch a live account.
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    req: HttpRequest,
    id: web::Path<EntityId>,
) -> ApiResult<UserEnvelope> {
    let account = state.users.get(&id).await?;
    Ok(user_envelope(StatusCode::OK, "User retrieved", account, &req))
}

/// Apply profile changes at the caller's expected version.
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    req: HttpRequest,
    id: web::Path<EntityId>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<UserEnvelope> {
    let changes = UpdateUserProfile::from(payload.into_inner());
    let account = state
        .users
        .update_profile(&id, changes, caller.security())
        .await?;
    Ok(user_envelope(StatusCode::OK, "User updated", account, &req))
}

/// Soft-delete an account.
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    req: HttpRequest,
    id: web::Path<EntityId>,
    query: web::Query<DeleteUserQuery>,
) -> ApiResult<UserEnvelope> {
    let expected = Version::new(query.expected_version);
    let account = state
        .users
        .delete(&id, expected, caller.security())
        .await?;
    Ok(user_envelope(StatusCode::OK, "User deleted", account, &req))
}

/// Restore a soft-deleted account.
#[post("/users/{id}/restore")]
pub async fn restore_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    req: HttpRequest,
    id: web::Path<EntityId>,
) -> ApiResult<UserEnvelope> {
    let account = state.users.restore(&id, caller.security()).await?;
    Ok(user_envelope(StatusCode::OK, "User restored", account, &req))
}

/// Register the user account routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register_user)
        .service(list_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user)
        .service(restore_user);
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
