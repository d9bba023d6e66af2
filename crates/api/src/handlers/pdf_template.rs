//! Handlers for the `/pdf-templates` resource.
//!
//! Any signed-in user may read and edit templates. Mutations go through
//! [`TemplateActions`] so every change is validated, logged and published.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use docflow_core::field_editor::FieldEdit;
use docflow_core::generation::{fill_pdf_fields, FilledDocument, PageSize};
use docflow_core::search::{filter_items, SearchMatcher};
use docflow_core::types::DbId;
use docflow_db::models::pdf_template::{CreatePdfTemplate, PdfTemplate, UpdatePdfTemplate};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::attachment_header;
use crate::middleware::auth::AuthUser;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::services::template_actions::{ActionError, ActionOutcome, Deleted, TemplateActions};
use crate::state::AppState;

/// Fields matched by `?search=`.
const SEARCH_FIELDS: [&str; 2] = ["name", "file_name"];

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /pdf-templates/{id}/fields`.
#[derive(Debug, Deserialize)]
pub struct FieldEditsRequest {
    pub edits: Vec<FieldEdit>,
}

/// Request body for `POST /pdf-templates/{id}/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Values keyed by field id.
    #[serde(default)]
    pub values: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub page_size: PageSize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/pdf-templates
///
/// List active templates, newest first, optionally filtered by `?search=`.
pub async fn list_pdf_templates(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<PdfTemplate>>>> {
    let templates = state.stores.pdf_templates.list().await?;
    let matcher = SearchMatcher::fields(SEARCH_FIELDS);
    let data = filter_items(&templates, &matcher, params.term())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/pdf-templates/{id}
pub async fn get_pdf_template(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PdfTemplate>>> {
    let template = find_template(&state, id).await?;
    Ok(Json(DataResponse { data: template }))
}

/// POST /api/v1/pdf-templates
///
/// Register an uploaded PDF and its initial field set. Returns 201.
pub async fn create_pdf_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePdfTemplate>,
) -> Result<(StatusCode, Json<ActionOutcome<PdfTemplate>>), ActionError> {
    let outcome = TemplateActions::from_state(&state)
        .create_pdf_template(auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /api/v1/pdf-templates/{id}
pub async fn update_pdf_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePdfTemplate>,
) -> Result<Json<ActionOutcome<PdfTemplate>>, ActionError> {
    let outcome = TemplateActions::from_state(&state)
        .update_pdf_template(auth.user_id, id, input)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/pdf-templates/{id}/fields
///
/// Apply a batch of add/update/delete field edits in order.
pub async fn edit_pdf_fields(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<FieldEditsRequest>,
) -> Result<Json<ActionOutcome<PdfTemplate>>, ActionError> {
    let outcome = TemplateActions::from_state(&state)
        .apply_field_edits(auth.user_id, id, input.edits)
        .await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/pdf-templates/{id}
pub async fn delete_pdf_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<ActionOutcome<Deleted>>, ActionError> {
    let outcome = TemplateActions::from_state(&state)
        .delete_pdf_template(auth.user_id, id)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/pdf-templates/{id}/generate
///
/// Fill the template's fields with the supplied values and return the
/// resulting layout as a JSON download.
pub async fn generate_pdf(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let template = find_template(&state, id).await?;
    let document: FilledDocument =
        fill_pdf_fields(&template.fields.0, &input.values, input.page_size)?;

    tracing::info!(
        template_id = id,
        user_id = auth.user_id,
        page_size = ?input.page_size,
        "PDF template filled"
    );

    Ok((
        [attachment_header(&template.name, "json")],
        Json(DataResponse { data: document }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_template(state: &AppState, id: DbId) -> AppResult<PdfTemplate> {
    state
        .stores
        .pdf_templates
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("PdfTemplate", id))
}
