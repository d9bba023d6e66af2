//! Handlers for the `/auth` resource (sign-up, sign-in, refresh, sign-out,
//! password reset).

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use docflow_core::credentials::{
    is_allowed_redirect, normalize_email, validate_email, validate_full_name, validate_password,
    LOCKOUT_DURATION_MINS, MAX_FAILED_LOGIN_ATTEMPTS, PASSWORD_RESET_TTL_MINS,
};
use docflow_core::error::CoreError;
use docflow_core::roles::ROLE_USER;
use docflow_core::types::DbId;
use docflow_db::models::session::{CreatePasswordResetToken, CreateSession};
use docflow_db::models::user::{CreateUser, User, UserResponse};
use docflow_events::EmailDelivery;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{hash_token, OpaqueToken};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Path appended to `APP_URL` when a reset request names no redirect.
const DEFAULT_RESET_PATH: &str = "/reset-password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// Request body for `POST /auth/signin`.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /auth/password-reset`.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
    /// Where the emailed link should land. Must point back into the app.
    pub redirect_to: Option<String>,
}

/// Request body for `POST /auth/password-reset/confirm`.
#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub new_password: String,
}

/// Successful authentication response returned by sign-up, sign-in and
/// refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Create a `user`-role account and sign it in. A taken email is 409.
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    validate_full_name(&input.full_name)?;
    validate_password(&input.password)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = state
        .stores
        .users
        .create(&CreateUser {
            email,
            full_name: input.full_name.trim().to_string(),
            password_hash,
            role: ROLE_USER.to_string(),
        })
        .await?;

    tracing::info!(user_id = user.id, "User signed up");

    let response = create_auth_response(&state, &user, user_agent(&headers)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/signin
///
/// Authenticate with email + password. Five consecutive failures lock the
/// account for 15 minutes.
pub async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SigninRequest>,
) -> AppResult<Json<AuthResponse>> {
    // 1. Find user by email.
    let email = normalize_email(&input.email);
    let user = state
        .stores
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // 2. Check if the account is active.
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    // 3. Check if the account is temporarily locked.
    if user.locked_until.is_some_and(|until| until > Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }

    // 4. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        // 5. On failure: increment counter, lock if threshold reached.
        let failures = state.stores.users.increment_failed_login(user.id).await?;
        if failures >= MAX_FAILED_LOGIN_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCKOUT_DURATION_MINS);
            state.stores.users.lock_account(user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed sign-ins");
        }
        return Err(invalid_credentials());
    }

    // 6. On success: reset failed count, set last_login_at.
    state.stores.users.record_successful_login(user.id).await?;

    let response = create_auth_response(&state, &user, user_agent(&headers)).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens. The old
/// refresh token is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_token(&input.refresh_token);

    let session = state
        .stores
        .sessions
        .consume_session(&token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = state
        .stores
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let response = create_auth_response(&state, &user, user_agent(&headers)).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/signout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn signout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    state
        .stores
        .sessions
        .revoke_all_for_user(auth_user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Json<UserResponse>> {
    let user = state
        .stores
        .users
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth_user.user_id))?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/v1/auth/password-reset
///
/// Always answers 202 Accepted for a well-formed request so the response
/// does not reveal whether the email is registered. For an active account
/// a one-hour token is stored (hashed) and the link is emailed.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(input): Json<PasswordResetRequest>,
) -> AppResult<StatusCode> {
    let redirect_to = match input.redirect_to {
        Some(redirect) => {
            if !is_allowed_redirect(&redirect, &state.config.allowed_redirect_prefixes()) {
                return Err(AppError::BadRequest(
                    "redirect_to must point to the application".into(),
                ));
            }
            redirect
        }
        None => format!("{}{DEFAULT_RESET_PATH}", state.config.app_url),
    };

    let email = normalize_email(&input.email);
    let Some(user) = state.stores.users.find_by_email(&email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return Ok(StatusCode::ACCEPTED);
    };
    if !user.is_active {
        tracing::debug!(user_id = user.id, "Password reset requested for inactive user");
        return Ok(StatusCode::ACCEPTED);
    }

    let OpaqueToken {
        plaintext: token,
        hash: token_hash,
    } = OpaqueToken::generate();
    state
        .stores
        .sessions
        .create_reset_token(&CreatePasswordResetToken {
            user_id: user.id,
            token_hash,
            expires_at: Utc::now() + chrono::Duration::minutes(PASSWORD_RESET_TTL_MINS),
        })
        .await?;

    let link = reset_link(&redirect_to, &token);
    match &state.mailer {
        Some(mailer) => spawn_reset_email(Arc::clone(mailer), user.email.clone(), link, user.id),
        None => {
            tracing::warn!(user_id = user.id, %link, "SMTP not configured, reset link not emailed");
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/auth/password-reset/confirm
///
/// Set a new password with a reset token. The token becomes unusable and
/// every session of the account is revoked.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(input): Json<PasswordResetConfirmRequest>,
) -> AppResult<StatusCode> {
    validate_password(&input.new_password)?;

    let reset = state
        .stores
        .sessions
        .find_valid_reset_token(&hash_token(&input.token))
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired reset token".into(),
            ))
        })?;

    // Claim the token first so a concurrent confirm cannot reuse it.
    if !state.stores.sessions.mark_reset_token_used(reset.id).await? {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid or expired reset token".into(),
        )));
    }

    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    if !state
        .stores
        .users
        .update_password(reset.user_id, &hashed)
        .await?
    {
        return Err(AppError::not_found("User", reset.user_id));
    }
    state.stores.sessions.revoke_all_for_user(reset.user_id).await?;

    tracing::info!(user_id = reset.user_id, "Password reset completed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Append the reset token to the redirect URL as a query parameter.
fn reset_link(redirect_to: &str, token: &str) -> String {
    let separator = if redirect_to.contains('?') { '&' } else { '?' };
    format!("{redirect_to}{separator}token={token}")
}

/// Send the reset email off the request path; failures are only logged.
fn spawn_reset_email(mailer: Arc<EmailDelivery>, to: String, link: String, user_id: DbId) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send_password_reset(&to, &link).await {
            tracing::error!(user_id, error = %e, "Failed to send password reset email");
        } else {
            tracing::info!(user_id, "Password reset email sent");
        }
    });
}

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(
    state: &AppState,
    user: &User,
    user_agent: Option<String>,
) -> AppResult<AuthResponse> {
    let issued = state
        .config
        .jwt
        .issue(user.id, &user.role)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    state
        .stores
        .sessions
        .create_session(&CreateSession {
            user_id: user.id,
            refresh_token_hash: issued.refresh.hash,
            expires_at: issued.refresh_expires_at,
            user_agent,
        })
        .await?;

    Ok(AuthResponse {
        access_token: issued.access_token,
        refresh_token: issued.refresh.plaintext,
        expires_in: state.config.jwt.access_ttl_secs(),
        user: UserResponse::from(user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_appends_token_as_query_parameter() {
        assert_eq!(
            reset_link("http://localhost:5173/reset-password", "abc"),
            "http://localhost:5173/reset-password?token=abc"
        );
        assert_eq!(
            reset_link("http://localhost:5173/reset?lang=es", "abc"),
            "http://localhost:5173/reset?lang=es&token=abc"
        );
    }
}
