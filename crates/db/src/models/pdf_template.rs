//! PDF template model and DTOs.

use docflow_core::pdf_field::PdfField;
use docflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `pdf_templates` table. `fields` is a JSONB array.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PdfTemplate {
    pub id: DbId,
    pub name: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_url: Option<String>,
    pub fields: Json<Vec<PdfField>>,
    pub is_active: bool,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a PDF template. `name` falls back to the file's base name.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePdfTemplate {
    pub name: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub file_size: i64,
    pub file_url: Option<String>,
    #[serde(default)]
    pub fields: Vec<PdfField>,
}

/// DTO for updating a PDF template. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePdfTemplate {
    pub name: Option<String>,
    pub file_url: Option<String>,
    pub fields: Option<Vec<PdfField>>,
}
