//! Handlers for the `/sales-requests` resource (contract workflow).
//!
//! Regular users only see and act on their own requests; admins see all.
//! Every status change is checked against the linear workflow in
//! [`docflow_core::contract`] before the store performs it, and publishes
//! `sales_request.status_changed` so the owner gets a notification.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use docflow_core::contract::{
    ensure_editable, ensure_signature_pending, transition, validate_health_answers,
    validate_rejection_reason, ContractStatus, HealthAnswer,
};
use docflow_core::credentials::validate_email;
use docflow_core::error::CoreError;
use docflow_core::search::{filter_items, SearchMatcher};
use docflow_core::types::DbId;
use docflow_core::whatsapp::{build_whatsapp_links, format_phone_for_whatsapp, WhatsAppLinks};
use docflow_db::models::sales_request::{
    CreateSalesRequest, SalesRequest, SalesRequestFilter, UpdateSalesRequest,
};
use docflow_events::{event_types, PlatformEvent};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "sales_request";

/// Fields matched by `?search=`.
const SEARCH_FIELDS: [&str; 4] = ["client_name", "client_email", "client_phone", "plan_name"];

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /sales-requests`.
#[derive(Debug, Default, Deserialize)]
pub struct SalesRequestQuery {
    pub status: Option<ContractStatus>,
    pub search: Option<String>,
}

/// Request body for `POST /sales-requests/{id}/health-declaration`.
#[derive(Debug, Deserialize)]
pub struct HealthDeclarationRequest {
    pub answers: Vec<HealthAnswer>,
}

/// Request body for `POST /sales-requests/{id}/signature-request`.
#[derive(Debug, Default, Deserialize)]
pub struct SignatureRequestBody {
    /// Reference returned by the e-signature provider.
    pub reference: Option<String>,
}

/// Request body for `POST /sales-requests/{id}/signature`.
#[derive(Debug, Default, Deserialize)]
pub struct SignatureBody {
    pub signed_document_url: Option<String>,
}

/// Request body for `POST /sales-requests/{id}/reject`.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Query parameters for `GET /sales-requests/{id}/whatsapp`.
#[derive(Debug, Default, Deserialize)]
pub struct WhatsAppQuery {
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/sales-requests
///
/// Admins list every request; other users only their own. Supports
/// `?status=` and `?search=`.
pub async fn list_sales_requests(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SalesRequestQuery>,
) -> AppResult<Json<DataResponse<Vec<SalesRequest>>>> {
    let filter = SalesRequestFilter {
        created_by: (!auth.is_admin()).then_some(auth.user_id),
        status: params.status,
    };
    let requests = state.stores.sales_requests.list(&filter).await?;

    let matcher = SearchMatcher::fields(SEARCH_FIELDS);
    let term = params.search.as_deref().unwrap_or("");
    let data = filter_items(&requests, &matcher, term)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/sales-requests/{id}
pub async fn get_sales_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SalesRequest>>> {
    let request = load_owned(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/sales-requests
///
/// Create a draft request owned by the caller. Returns 201.
pub async fn create_sales_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSalesRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SalesRequest>>)> {
    let input = CreateSalesRequest {
        client_name: input.client_name.trim().to_string(),
        plan_name: input.plan_name.trim().to_string(),
        ..input
    };
    validate_client_data(
        Some(&input.client_name),
        input.client_email.as_deref(),
        Some(&input.client_phone),
        Some(&input.plan_name),
        input.monthly_amount,
    )?;

    let request = state
        .stores
        .sales_requests
        .create(auth.user_id, &input)
        .await?;

    tracing::info!(
        sales_request_id = request.id,
        user_id = auth.user_id,
        "Sales request created"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::SALES_REQUEST_CREATED)
            .with_source(ENTITY, request.id)
            .with_actor(auth.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// PUT /api/v1/sales-requests/{id}
///
/// Edit client data. Only drafts are editable.
pub async fn update_sales_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSalesRequest>,
) -> AppResult<Json<DataResponse<SalesRequest>>> {
    let current = load_owned(&state, &auth, id).await?;
    ensure_editable(current.status()?)?;

    let input = UpdateSalesRequest {
        client_name: input.client_name.map(|s| s.trim().to_string()),
        plan_name: input.plan_name.map(|s| s.trim().to_string()),
        ..input
    };
    validate_client_data(
        input.client_name.as_deref(),
        input.client_email.as_deref(),
        input.client_phone.as_deref(),
        input.plan_name.as_deref(),
        input.monthly_amount,
    )?;

    let updated = state
        .stores
        .sales_requests
        .update(id, &input)
        .await?
        .ok_or_else(|| moved_on(id))?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::SALES_REQUEST_UPDATED)
            .with_source(ENTITY, id)
            .with_actor(auth.user_id),
    );

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// POST /api/v1/sales-requests/{id}/submit
///
/// draft -> pending_health_declaration.
pub async fn submit_sales_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SalesRequest>>> {
    let current = load_owned(&state, &auth, id).await?;
    let from = current.status()?;
    transition(from, ContractStatus::PendingHealthDeclaration)?;

    let updated = state
        .stores
        .sales_requests
        .submit(id)
        .await?
        .ok_or_else(|| moved_on(id))?;

    publish_status_change(&state, &auth, from, &updated);
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sales-requests/{id}/health-declaration
///
/// Record the client's health answers; pending_health_declaration ->
/// pending_signature.
pub async fn declare_health(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<HealthDeclarationRequest>,
) -> AppResult<Json<DataResponse<SalesRequest>>> {
    let current = load_owned(&state, &auth, id).await?;
    let from = current.status()?;
    transition(from, ContractStatus::PendingSignature)?;
    validate_health_answers(&input.answers)?;

    let updated = state
        .stores
        .sales_requests
        .declare_health(id, &input.answers)
        .await?
        .ok_or_else(|| moved_on(id))?;

    publish_status_change(&state, &auth, from, &updated);
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sales-requests/{id}/signature-request
///
/// Stamp `signature_requested_at`. Idempotent: repeating the call keeps the
/// first timestamp. Does not change the status.
pub async fn request_signature(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SignatureRequestBody>,
) -> AppResult<Json<DataResponse<SalesRequest>>> {
    let current = load_owned(&state, &auth, id).await?;
    ensure_signature_pending(current.status()?)?;

    let updated = state
        .stores
        .sales_requests
        .request_signature(id, body.reference.as_deref())
        .await?
        .ok_or_else(|| moved_on(id))?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::SALES_REQUEST_UPDATED)
            .with_source(ENTITY, id)
            .with_actor(auth.user_id),
    );

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sales-requests/{id}/signature
///
/// Record the completed signature; pending_signature -> completed.
pub async fn record_signature(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SignatureBody>,
) -> AppResult<Json<DataResponse<SalesRequest>>> {
    let current = load_owned(&state, &auth, id).await?;
    let from = current.status()?;
    transition(from, ContractStatus::Completed)?;

    let updated = state
        .stores
        .sales_requests
        .record_signature(id, body.signed_document_url.as_deref())
        .await?
        .ok_or_else(|| moved_on(id))?;

    publish_status_change(&state, &auth, from, &updated);
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sales-requests/{id}/reject
///
/// Reject a request that has not yet completed.
pub async fn reject_sales_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<Json<DataResponse<SalesRequest>>> {
    let current = load_owned(&state, &auth, id).await?;
    let from = current.status()?;
    transition(from, ContractStatus::Rejected)?;
    let reason = validate_rejection_reason(&input.reason)?;

    let updated = state
        .stores
        .sales_requests
        .reject(id, &reason)
        .await?
        .ok_or_else(|| moved_on(id))?;

    publish_status_change(&state, &auth, from, &updated);
    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/sales-requests/{id}/whatsapp
///
/// Build WhatsApp links to the client's phone with an optional `?message=`.
pub async fn whatsapp_links(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<WhatsAppQuery>,
) -> AppResult<Json<DataResponse<WhatsAppLinks>>> {
    let request = load_owned(&state, &auth, id).await?;
    if format_phone_for_whatsapp(&request.client_phone).is_empty() {
        return Err(AppError::BadRequest(
            "Client phone has no digits to message".into(),
        ));
    }

    let message = params
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Hola {}", request.client_name));
    let links = build_whatsapp_links(&request.client_phone, &message);
    Ok(Json(DataResponse { data: links }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a request the caller may act on: its owner or any admin.
async fn load_owned(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<SalesRequest> {
    let request = state
        .stores
        .sales_requests
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("SalesRequest", id))?;

    if request.created_by != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Sales request belongs to another user".into(),
        )));
    }
    Ok(request)
}

/// The store refused a compare-and-set: someone else changed the status
/// between our read and the write.
fn moved_on(id: DbId) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Sales request {id} changed status concurrently"
    )))
}

fn publish_status_change(
    state: &AppState,
    auth: &AuthUser,
    previous: ContractStatus,
    updated: &SalesRequest,
) {
    tracing::info!(
        sales_request_id = updated.id,
        from = %previous,
        to = %updated.status,
        user_id = auth.user_id,
        "Sales request status changed"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::SALES_REQUEST_STATUS_CHANGED)
            .with_source(ENTITY, updated.id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({
                "owner_id": updated.created_by,
                "status": updated.status,
                "previous": previous,
                "client_name": updated.client_name,
            })),
    );
}

fn validate_client_data(
    client_name: Option<&str>,
    client_email: Option<&str>,
    client_phone: Option<&str>,
    plan_name: Option<&str>,
    monthly_amount: Option<f64>,
) -> Result<(), CoreError> {
    if client_name.is_some_and(|n| n.trim().is_empty()) {
        return Err(CoreError::Validation("Client name must not be empty".into()));
    }
    if let Some(email) = client_email.filter(|e| !e.trim().is_empty()) {
        validate_email(email.trim())?;
    }
    if client_phone.is_some_and(|p| format_phone_for_whatsapp(p).is_empty()) {
        return Err(CoreError::Validation(
            "Client phone must contain digits".into(),
        ));
    }
    if plan_name.is_some_and(|n| n.trim().is_empty()) {
        return Err(CoreError::Validation("Plan name must not be empty".into()));
    }
    if monthly_amount.is_some_and(|a| !a.is_finite() || a < 0.0) {
        return Err(CoreError::Validation(
            "Monthly amount must be a non-negative number".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn client_data_rules() {
        assert!(validate_client_data(
            Some("Ana"),
            Some("ana@example.com"),
            Some("+54 11 1234"),
            Some("Oro"),
            Some(10.0)
        )
        .is_ok());
        assert!(validate_client_data(None, None, None, None, None).is_ok());
        assert_matches!(
            validate_client_data(Some("  "), None, None, None, None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_client_data(None, Some("not-an-email"), None, None, None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_client_data(None, None, Some("sin número"), None, None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_client_data(None, None, None, None, Some(-1.0)),
            Err(CoreError::Validation(_))
        );
    }
}
