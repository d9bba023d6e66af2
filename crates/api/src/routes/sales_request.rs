//! Route definitions for the `/sales-requests` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sales_request;
use crate::state::AppState;

/// Routes mounted at `/sales-requests`.
///
/// ```text
/// GET  /                            -> list_sales_requests (?status=&search=)
/// POST /                            -> create_sales_request
/// GET  /{id}                        -> get_sales_request
/// PUT  /{id}                        -> update_sales_request
/// POST /{id}/submit                 -> submit_sales_request
/// POST /{id}/health-declaration     -> declare_health
/// POST /{id}/signature-request      -> request_signature
/// POST /{id}/signature              -> record_signature
/// POST /{id}/reject                 -> reject_sales_request
/// GET  /{id}/whatsapp               -> whatsapp_links (?message=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(sales_request::list_sales_requests).post(sales_request::create_sales_request),
        )
        .route(
            "/{id}",
            get(sales_request::get_sales_request).put(sales_request::update_sales_request),
        )
        .route("/{id}/submit", post(sales_request::submit_sales_request))
        .route(
            "/{id}/health-declaration",
            post(sales_request::declare_health),
        )
        .route(
            "/{id}/signature-request",
            post(sales_request::request_signature),
        )
        .route("/{id}/signature", post(sales_request::record_signature))
        .route("/{id}/reject", post(sales_request::reject_sales_request))
        .route("/{id}/whatsapp", get(sales_request::whatsapp_links))
}
