pub mod admin;
pub mod auth;
pub mod customization;
pub mod document_template;
pub mod health;
pub mod notification;
pub mod pdf_template;
pub mod sales_request;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws?token=                                  WebSocket change feed
///
/// /auth/signup                                sign-up (public)
/// /auth/signin                                sign-in (public)
/// /auth/refresh                               refresh (public)
/// /auth/signout                               sign-out (requires auth)
/// /auth/me                                    current user (requires auth)
/// /auth/password-reset                        request reset email (public)
/// /auth/password-reset/confirm                set new password (public)
///
/// /admin/users                                list, create (admin only)
/// /admin/users/{id}                           get, update, deactivate
/// /admin/users/{id}/reset-password            reset password
/// /admin/notifications                        send notification (POST)
/// /admin/customizations/{key}                 set, delete (PUT, DELETE)
///
/// /customizations                             list (auth required)
///
/// /pdf-templates                              list, create
/// /pdf-templates/{id}                         get, update, delete
/// /pdf-templates/{id}/fields                  batch field edits (POST)
/// /pdf-templates/{id}/generate                fill fields, download (POST)
///
/// /document-templates                         list, create
/// /document-templates/{id}                    get, update, delete
/// /document-templates/{id}/render             render HTML, download (POST)
///
/// /sales-requests                             list, create
/// /sales-requests/{id}                        get, update
/// /sales-requests/{id}/submit                 draft -> health declaration
/// /sales-requests/{id}/health-declaration     -> pending signature
/// /sales-requests/{id}/signature-request      stamp signature request
/// /sales-requests/{id}/signature              -> completed
/// /sales-requests/{id}/reject                 -> rejected
/// /sales-requests/{id}/whatsapp               WhatsApp links (GET)
///
/// /notifications                              list
/// /notifications/unread-count                 unread count
/// /notifications/read-all                     mark all read (POST)
/// /notifications/{id}                         delete
/// /notifications/{id}/read                    mark read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket change feed.
        .route("/ws", get(ws::ws_handler))
        // Authentication routes.
        .nest("/auth", auth::router())
        // Admin routes (users, broadcast notifications, customizations).
        .nest("/admin", admin::router())
        // Branding settings readable by every signed-in user.
        .nest("/customizations", customization::router())
        // Templates.
        .nest("/pdf-templates", pdf_template::router())
        .nest("/document-templates", document_template::router())
        // Contract workflow.
        .nest("/sales-requests", sales_request::router())
        // Notifications.
        .nest("/notifications", notification::router())
}
