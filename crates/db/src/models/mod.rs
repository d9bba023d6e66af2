//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod customization;
pub mod document_template;
pub mod notification;
pub mod pdf_template;
pub mod sales_request;
pub mod session;
pub mod user;
