//! Branding customization model.

use docflow_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `customizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customization {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_by: Option<DbId>,
    pub updated_at: Timestamp,
}
