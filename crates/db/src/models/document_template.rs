//! HTML document template model and DTOs.

use docflow_core::document_render::{DocumentField, DocumentTemplateType};
use docflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `document_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentTemplate {
    pub id: DbId,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub template_type: String,
    pub fields: Json<Vec<DocumentField>>,
    pub content: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: DocumentTemplateType,
    #[serde(default)]
    pub fields: Vec<DocumentField>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocumentTemplate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub template_type: Option<DocumentTemplateType>,
    pub fields: Option<Vec<DocumentField>>,
    pub content: Option<String>,
}
