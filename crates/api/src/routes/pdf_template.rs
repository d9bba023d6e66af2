//! Route definitions for the `/pdf-templates` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::pdf_template;
use crate::state::AppState;

/// Routes mounted at `/pdf-templates`.
///
/// ```text
/// GET    /                 -> list_pdf_templates (?search=)
/// POST   /                 -> create_pdf_template
/// GET    /{id}             -> get_pdf_template
/// PUT    /{id}             -> update_pdf_template
/// DELETE /{id}             -> delete_pdf_template
/// POST   /{id}/fields      -> edit_pdf_fields
/// POST   /{id}/generate    -> generate_pdf
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(pdf_template::list_pdf_templates).post(pdf_template::create_pdf_template),
        )
        .route(
            "/{id}",
            get(pdf_template::get_pdf_template)
                .put(pdf_template::update_pdf_template)
                .delete(pdf_template::delete_pdf_template),
        )
        .route("/{id}/fields", post(pdf_template::edit_pdf_fields))
        .route("/{id}/generate", post(pdf_template::generate_pdf))
}
