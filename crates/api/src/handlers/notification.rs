//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`]; users only ever
//! see their own notifications. Each mutation publishes a
//! `notification.*` event that the notification router pushes to the
//! owner's WebSocket connections.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use docflow_core::notification::{validate_notification_text, NotificationKind};
use docflow_core::search::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use docflow_core::types::DbId;
use docflow_db::models::notification::{CreateNotification, Notification};
use docflow_events::{event_types, PlatformEvent};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "notification";

// ---------------------------------------------------------------------------
// Query / request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Request body for `POST /admin/notifications`.
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    /// Recipient. When absent, every active user receives a copy.
    pub user_id: Option<DbId>,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
}

// ---------------------------------------------------------------------------
// User endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// List the authenticated user's notifications, newest first.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications = state
        .stores
        .notifications
        .list_for_user(auth.user_id, unread_only, limit, offset)
        .await?;

    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = state.stores.notifications.unread_count(auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "count": count }
    })))
}

/// POST /api/v1/notifications/{id}/read
///
/// Mark a single notification as read. Marking an already-read
/// notification keeps its original `read_at`. Returns 404 if the
/// notification does not belong to the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let notification = state
        .stores
        .notifications
        .mark_read(notification_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Notification", notification_id))?;

    publish(
        &state,
        event_types::NOTIFICATION_READ,
        notification_id,
        serde_json::json!({
            "user_id": auth.user_id,
            "id": notification_id,
            "read_at": notification.read_at,
        }),
    );

    Ok(Json(DataResponse { data: notification }))
}

/// POST /api/v1/notifications/read-all
///
/// Mark all of the caller's notifications as read and return how many
/// changed.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = state.stores.notifications.mark_all_read(auth.user_id).await?;

    if count > 0 {
        state.event_bus.publish(
            PlatformEvent::new(event_types::NOTIFICATION_READ_ALL)
                .with_actor(auth.user_id)
                .with_payload(serde_json::json!({
                    "user_id": auth.user_id,
                    "count": count,
                })),
        );
    }

    Ok(Json(serde_json::json!({
        "data": { "marked_read": count }
    })))
}

/// DELETE /api/v1/notifications/{id}
///
/// Returns 204 No Content, or 404 if the notification is not the caller's.
pub async fn delete_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = state
        .stores
        .notifications
        .delete(notification_id, auth.user_id)
        .await?;

    if !deleted {
        return Err(AppError::not_found("Notification", notification_id));
    }

    publish(
        &state,
        event_types::NOTIFICATION_DELETED,
        notification_id,
        serde_json::json!({ "user_id": auth.user_id, "id": notification_id }),
    );

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Admin endpoint
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/notifications
///
/// Send a notification to one user, or to every active user when
/// `user_id` is omitted. Returns 201 with the created rows.
pub async fn send_notification(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<SendNotificationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<Notification>>>)> {
    let title = input.title.trim().to_string();
    let message = input.message.trim().to_string();
    validate_notification_text(&title, &message)?;

    let recipients = match input.user_id {
        Some(user_id) => {
            let user = state
                .stores
                .users
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::not_found("User", user_id))?;
            vec![user.id]
        }
        None => state.stores.users.list_active_ids().await?,
    };

    let mut created = Vec::with_capacity(recipients.len());
    for user_id in recipients {
        let notification = state
            .stores
            .notifications
            .create(&CreateNotification {
                user_id,
                title: title.clone(),
                message: message.clone(),
                kind: input.kind,
            })
            .await?;

        publish(
            &state,
            event_types::NOTIFICATION_CREATED,
            notification.id,
            serde_json::json!({ "user_id": user_id, "notification": notification }),
        );
        created.push(notification);
    }

    tracing::info!(
        admin_id = admin.user_id,
        recipients = created.len(),
        kind = %input.kind,
        "Notification sent"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

fn publish(state: &AppState, event_type: &str, id: DbId, payload: serde_json::Value) {
    state.event_bus.publish(
        PlatformEvent::new(event_type)
            .with_source(ENTITY, id)
            .with_payload(payload),
    );
}
