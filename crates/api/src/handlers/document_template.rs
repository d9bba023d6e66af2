//! Handlers for the `/document-templates` resource (HTML templates).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use docflow_core::document_render::render_document;
use docflow_core::search::{filter_items, SearchMatcher};
use docflow_core::types::DbId;
use docflow_db::models::document_template::{
    CreateDocumentTemplate, DocumentTemplate, UpdateDocumentTemplate,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::attachment_header;
use crate::middleware::auth::AuthUser;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::services::template_actions::{ActionError, ActionOutcome, Deleted, TemplateActions};
use crate::state::AppState;

/// Serialized field names matched by `?search=`; `type` is the template type.
const SEARCH_FIELDS: [&str; 2] = ["name", "type"];

/// Request body for `POST /document-templates/{id}/render`.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Values keyed by document field name.
    #[serde(default)]
    pub values: HashMap<String, serde_json::Value>,
}

/// GET /api/v1/document-templates
pub async fn list_document_templates(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<DocumentTemplate>>>> {
    let templates = state.stores.document_templates.list().await?;
    let matcher = SearchMatcher::fields(SEARCH_FIELDS);
    let data = filter_items(&templates, &matcher, params.term())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/document-templates/{id}
pub async fn get_document_template(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocumentTemplate>>> {
    let template = find_template(&state, id).await?;
    Ok(Json(DataResponse { data: template }))
}

/// POST /api/v1/document-templates
pub async fn create_document_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDocumentTemplate>,
) -> Result<(StatusCode, Json<ActionOutcome<DocumentTemplate>>), ActionError> {
    let outcome = TemplateActions::from_state(&state)
        .create_document_template(auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /api/v1/document-templates/{id}
pub async fn update_document_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocumentTemplate>,
) -> Result<Json<ActionOutcome<DocumentTemplate>>, ActionError> {
    let outcome = TemplateActions::from_state(&state)
        .update_document_template(auth.user_id, id, input)
        .await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/document-templates/{id}
pub async fn delete_document_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<ActionOutcome<Deleted>>, ActionError> {
    let outcome = TemplateActions::from_state(&state)
        .delete_document_template(auth.user_id, id)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/document-templates/{id}/render
///
/// Substitute the supplied values into the template and return the HTML as
/// a download.
pub async fn render_document_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RenderRequest>,
) -> AppResult<impl IntoResponse> {
    let template = find_template(&state, id).await?;
    let html = render_document(&template.content, &template.fields.0, &input.values)?;

    tracing::info!(template_id = id, user_id = auth.user_id, "Document template rendered");

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8")),
            attachment_header(&template.name, "html"),
        ],
        html,
    ))
}

async fn find_template(state: &AppState, id: DbId) -> AppResult<DocumentTemplate> {
    state
        .stores
        .document_templates
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("DocumentTemplate", id))
}
