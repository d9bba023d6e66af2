//! Handlers for the `/admin/users` resource (user management).
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use docflow_core::credentials::{
    normalize_email, validate_email, validate_full_name, validate_password,
};
use docflow_core::error::CoreError;
use docflow_core::roles::{validate_role, ROLE_USER};
use docflow_core::types::DbId;
use docflow_db::models::user::{CreateUser, UpdateUser, UserResponse};
use serde::Deserialize;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
    /// Defaults to `user`.
    pub role: Option<String>,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /admin/users/{id}/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/users
///
/// Create an account on someone's behalf. Returns 201.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    validate_full_name(&input.full_name)?;
    validate_password(&input.password)?;
    let role = input.role.unwrap_or_else(|| ROLE_USER.to_string());
    validate_role(&role).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hashed = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = state
        .stores
        .users
        .create(&CreateUser {
            email,
            full_name: input.full_name.trim().to_string(),
            password_hash: hashed,
            role,
        })
        .await?;

    tracing::info!(user_id = user.id, admin_id = admin.user_id, "User created by admin");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = state.stores.users.list().await?;
    let data = users.iter().map(UserResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state
        .stores
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Update profile fields, role or active flag (not the password). Admins
/// cannot change their own role or deactivate themselves.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if let Some(name) = &input.full_name {
        validate_full_name(name)?;
    }
    if let Some(role) = &input.role {
        validate_role(role).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }
    if id == admin.user_id
        && (input.role.as_deref().is_some_and(|r| r != admin.role)
            || input.is_active == Some(false))
    {
        return Err(AppError::Core(CoreError::Conflict(
            "Admins cannot demote or deactivate themselves".into(),
        )));
    }

    let update = UpdateUser {
        full_name: input.full_name.map(|n| n.trim().to_string()),
        role: input.role,
        is_active: input.is_active,
    };
    let user = state
        .stores
        .users
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    if !user.is_active {
        state.stores.sessions.revoke_all_for_user(id).await?;
    }

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Soft-deactivate a user and revoke their sessions. Returns 204 No Content.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "Admins cannot deactivate themselves".into(),
        )));
    }

    if !state.stores.users.deactivate(id).await? {
        return Err(AppError::not_found("User", id));
    }
    let revoked = state.stores.sessions.revoke_all_for_user(id).await?;

    tracing::info!(user_id = id, admin_id = admin.user_id, revoked, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/{id}/reset-password
///
/// Set a new password for a user and sign them out everywhere.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password(&input.new_password)?;

    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !state.stores.users.update_password(id, &hashed).await? {
        return Err(AppError::not_found("User", id));
    }
    state.stores.sessions.revoke_all_for_user(id).await?;

    tracing::info!(user_id = id, admin_id = admin.user_id, "Password reset by admin");
    Ok(StatusCode::NO_CONTENT)
}
