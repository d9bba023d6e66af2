//! Repository for the `document_templates` table.

use docflow_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::document_template::{
    CreateDocumentTemplate, DocumentTemplate, UpdateDocumentTemplate,
};

const COLUMNS: &str =
    r#"id, name, "type", fields, content, created_by, created_at, updated_at"#;

/// Provides CRUD operations for HTML document templates. Deletion is hard.
pub struct DocumentTemplateRepo;

impl DocumentTemplateRepo {
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateDocumentTemplate,
    ) -> Result<DocumentTemplate, sqlx::Error> {
        let query = format!(
            r#"INSERT INTO document_templates (name, "type", fields, content, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"#
        );
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .bind(&input.name)
            .bind(input.template_type.as_str())
            .bind(Json(&input.fields))
            .bind(&input.content)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DocumentTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM document_templates WHERE id = $1");
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all templates, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<DocumentTemplate>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM document_templates ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocumentTemplate,
    ) -> Result<Option<DocumentTemplate>, sqlx::Error> {
        let query = format!(
            r#"UPDATE document_templates SET
                name = COALESCE($2, name),
                "type" = COALESCE($3, "type"),
                fields = COALESCE($4, fields),
                content = COALESCE($5, content),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"#
        );
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.template_type.map(|t| t.as_str()))
            .bind(input.fields.as_ref().map(Json))
            .bind(&input.content)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a template. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM document_templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
