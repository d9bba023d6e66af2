//! Handlers for branding customizations.
//!
//! Any signed-in user can read the settings; only admins change them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use docflow_core::customization::{validate_key, validate_value};
use docflow_core::types::DbId;
use docflow_db::models::customization::Customization;
use docflow_events::{event_types, PlatformEvent};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /admin/customizations/{key}`.
#[derive(Debug, Deserialize)]
pub struct SetCustomizationRequest {
    pub value: serde_json::Value,
}

/// GET /api/v1/customizations
pub async fn list_customizations(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Customization>>>> {
    let items = state.stores.customizations.list().await?;
    Ok(Json(DataResponse { data: items }))
}

/// PUT /api/v1/admin/customizations/{key}
///
/// Create or replace a setting.
pub async fn set_customization(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<SetCustomizationRequest>,
) -> AppResult<Json<DataResponse<Customization>>> {
    validate_key(&key)?;
    validate_value(&key, &input.value)?;

    let item = state
        .stores
        .customizations
        .upsert(&key, &input.value, admin.user_id)
        .await?;

    tracing::info!(key = %key, admin_id = admin.user_id, "Customization updated");
    publish_change(&state, admin.user_id, &key, Some(&item.value));

    Ok(Json(DataResponse { data: item }))
}

/// DELETE /api/v1/admin/customizations/{key}
///
/// Idempotent: deleting a missing key is still 204.
pub async fn delete_customization(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    validate_key(&key)?;

    if state.stores.customizations.delete(&key).await? {
        tracing::info!(key = %key, admin_id = admin.user_id, "Customization removed");
        publish_change(&state, admin.user_id, &key, None);
    }

    Ok(StatusCode::NO_CONTENT)
}

fn publish_change(state: &AppState, actor: DbId, key: &str, value: Option<&serde_json::Value>) {
    state.event_bus.publish(
        PlatformEvent::new(event_types::CUSTOMIZATION_CHANGED)
            .with_actor(actor)
            .with_payload(serde_json::json!({ "key": key, "value": value })),
    );
}
