//! Sales request (contract) model and DTOs.

use docflow_core::contract::{ContractStatus, HealthAnswer};
use docflow_core::error::CoreError;
use docflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `sales_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SalesRequest {
    pub id: DbId,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: String,
    pub client_document: Option<String>,
    pub plan_name: String,
    pub monthly_amount: Option<f64>,
    pub document_template_id: Option<DbId>,
    pub pdf_template_id: Option<DbId>,
    pub status: String,
    pub health_answers: Option<Json<Vec<HealthAnswer>>>,
    pub health_declared_at: Option<Timestamp>,
    pub signature_requested_at: Option<Timestamp>,
    pub signature_reference: Option<String>,
    pub signed_at: Option<Timestamp>,
    pub signed_document_url: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SalesRequest {
    /// Parsed workflow status.
    pub fn status(&self) -> Result<ContractStatus, CoreError> {
        self.status.parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSalesRequest {
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: String,
    pub client_document: Option<String>,
    pub plan_name: String,
    pub monthly_amount: Option<f64>,
    pub document_template_id: Option<DbId>,
    pub pdf_template_id: Option<DbId>,
}

/// Client data edits. Only allowed while the request is a draft.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSalesRequest {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub client_document: Option<String>,
    pub plan_name: Option<String>,
    pub monthly_amount: Option<f64>,
    pub document_template_id: Option<DbId>,
    pub pdf_template_id: Option<DbId>,
}

/// Filters for listing sales requests.
#[derive(Debug, Clone, Default)]
pub struct SalesRequestFilter {
    /// Restrict to requests created by this user.
    pub created_by: Option<DbId>,
    pub status: Option<ContractStatus>,
}
