//! Repository for the `pdf_templates` table.

use docflow_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::pdf_template::{CreatePdfTemplate, PdfTemplate, UpdatePdfTemplate};

const COLUMNS: &str = "id, name, file_name, file_size, file_url, fields, is_active, \
                       created_by, created_at, updated_at";

/// Provides CRUD operations for PDF templates. Deletion is soft.
pub struct PdfTemplateRepo;

impl PdfTemplateRepo {
    /// Insert a new template, returning the created row.
    ///
    /// A missing `name` falls back to the file name; callers normally
    /// resolve it first.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreatePdfTemplate,
    ) -> Result<PdfTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO pdf_templates (name, file_name, file_size, file_url, fields, created_by)
             VALUES (COALESCE($1, $2), $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PdfTemplate>(&query)
            .bind(&input.name)
            .bind(&input.file_name)
            .bind(input.file_size)
            .bind(&input.file_url)
            .bind(Json(&input.fields))
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find an active template by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PdfTemplate>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM pdf_templates WHERE id = $1 AND is_active = true");
        sqlx::query_as::<_, PdfTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active templates, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<PdfTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pdf_templates
             WHERE is_active = true
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PdfTemplate>(&query).fetch_all(pool).await
    }

    /// Update a template. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePdfTemplate,
    ) -> Result<Option<PdfTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE pdf_templates SET
                name = COALESCE($2, name),
                file_url = COALESCE($3, file_url),
                fields = COALESCE($4, fields),
                updated_at = NOW()
             WHERE id = $1 AND is_active = true
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PdfTemplate>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.file_url)
            .bind(input.fields.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a template. Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pdf_templates SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
