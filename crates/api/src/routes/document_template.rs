//! Route definitions for the `/document-templates` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::document_template;
use crate::state::AppState;

/// Routes mounted at `/document-templates`.
///
/// ```text
/// GET    /               -> list_document_templates (?search=)
/// POST   /               -> create_document_template
/// GET    /{id}           -> get_document_template
/// PUT    /{id}           -> update_document_template
/// DELETE /{id}           -> delete_document_template
/// POST   /{id}/render    -> render_document_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(document_template::list_document_templates)
                .post(document_template::create_document_template),
        )
        .route(
            "/{id}",
            get(document_template::get_document_template)
                .put(document_template::update_document_template)
                .delete(document_template::delete_document_template),
        )
        .route(
            "/{id}/render",
            post(document_template::render_document_template),
        )
}
