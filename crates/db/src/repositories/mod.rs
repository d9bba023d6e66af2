//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod customization_repo;
pub mod document_template_repo;
pub mod notification_repo;
pub mod password_reset_repo;
pub mod pdf_template_repo;
pub mod sales_request_repo;
pub mod session_repo;
pub mod user_repo;

pub use customization_repo::CustomizationRepo;
pub use document_template_repo::DocumentTemplateRepo;
pub use notification_repo::NotificationRepo;
pub use password_reset_repo::PasswordResetRepo;
pub use pdf_template_repo::PdfTemplateRepo;
pub use sales_request_repo::SalesRequestRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
