//! Repository for the `sales_requests` table.
//!
//! Status-changing methods are compare-and-set on the expected current
//! status and return `None` when the row is missing or already moved on.

use docflow_core::contract::{ContractStatus, HealthAnswer};
use docflow_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::sales_request::{
    CreateSalesRequest, SalesRequest, SalesRequestFilter, UpdateSalesRequest,
};

const COLUMNS: &str = "id, client_name, client_email, client_phone, client_document, \
    plan_name, monthly_amount, document_template_id, pdf_template_id, status, \
    health_answers, health_declared_at, signature_requested_at, signature_reference, \
    signed_at, signed_document_url, rejection_reason, created_by, created_at, updated_at";

pub struct SalesRequestRepo;

impl SalesRequestRepo {
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateSalesRequest,
    ) -> Result<SalesRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO sales_requests
                (client_name, client_email, client_phone, client_document, plan_name,
                 monthly_amount, document_template_id, pdf_template_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(&input.client_name)
            .bind(&input.client_email)
            .bind(&input.client_phone)
            .bind(&input.client_document)
            .bind(&input.plan_name)
            .bind(input.monthly_amount)
            .bind(input.document_template_id)
            .bind(input.pdf_template_id)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SalesRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sales_requests WHERE id = $1");
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests, newest first, optionally filtered by owner and status.
    pub async fn list(
        pool: &PgPool,
        filter: &SalesRequestFilter,
    ) -> Result<Vec<SalesRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sales_requests
             WHERE ($1::BIGINT IS NULL OR created_by = $1)
               AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(filter.created_by)
            .bind(filter.status.map(ContractStatus::as_str))
            .fetch_all(pool)
            .await
    }

    /// Update client data. Only applies while the request is a draft.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSalesRequest,
    ) -> Result<Option<SalesRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_requests SET
                client_name = COALESCE($2, client_name),
                client_email = COALESCE($3, client_email),
                client_phone = COALESCE($4, client_phone),
                client_document = COALESCE($5, client_document),
                plan_name = COALESCE($6, plan_name),
                monthly_amount = COALESCE($7, monthly_amount),
                document_template_id = COALESCE($8, document_template_id),
                pdf_template_id = COALESCE($9, pdf_template_id),
                updated_at = NOW()
             WHERE id = $1 AND status = 'draft'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(id)
            .bind(&input.client_name)
            .bind(&input.client_email)
            .bind(&input.client_phone)
            .bind(&input.client_document)
            .bind(&input.plan_name)
            .bind(input.monthly_amount)
            .bind(input.document_template_id)
            .bind(input.pdf_template_id)
            .fetch_optional(pool)
            .await
    }

    /// draft -> pending_health_declaration.
    pub async fn submit(pool: &PgPool, id: DbId) -> Result<Option<SalesRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_requests SET status = 'pending_health_declaration', updated_at = NOW()
             WHERE id = $1 AND status = 'draft'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// pending_health_declaration -> pending_signature, storing the answers.
    pub async fn declare_health(
        pool: &PgPool,
        id: DbId,
        answers: &[HealthAnswer],
    ) -> Result<Option<SalesRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_requests SET
                status = 'pending_signature',
                health_answers = $2,
                health_declared_at = NOW(),
                updated_at = NOW()
             WHERE id = $1 AND status = 'pending_health_declaration'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(id)
            .bind(Json(answers))
            .fetch_optional(pool)
            .await
    }

    /// Stamp the signature request. Repeat calls keep the first timestamp.
    pub async fn request_signature(
        pool: &PgPool,
        id: DbId,
        reference: Option<&str>,
    ) -> Result<Option<SalesRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_requests SET
                signature_requested_at = COALESCE(signature_requested_at, NOW()),
                signature_reference = COALESCE($2, signature_reference),
                updated_at = NOW()
             WHERE id = $1 AND status = 'pending_signature'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(id)
            .bind(reference)
            .fetch_optional(pool)
            .await
    }

    /// pending_signature -> completed.
    pub async fn record_signature(
        pool: &PgPool,
        id: DbId,
        signed_document_url: Option<&str>,
    ) -> Result<Option<SalesRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_requests SET
                status = 'completed',
                signed_at = NOW(),
                signed_document_url = $2,
                updated_at = NOW()
             WHERE id = $1 AND status = 'pending_signature'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(id)
            .bind(signed_document_url)
            .fetch_optional(pool)
            .await
    }

    /// Any non-terminal status -> rejected.
    pub async fn reject(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<Option<SalesRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_requests SET
                status = 'rejected',
                rejection_reason = $2,
                updated_at = NOW()
             WHERE id = $1 AND status NOT IN ('completed', 'rejected')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SalesRequest>(&query)
            .bind(id)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }
}
