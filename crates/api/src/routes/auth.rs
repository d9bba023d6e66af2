//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /signup                    -> signup
/// POST /signin                    -> signin
/// POST /refresh                   -> refresh
/// POST /signout                   -> signout
/// GET  /me                        -> me
/// POST /password-reset            -> request_password_reset
/// POST /password-reset/confirm    -> confirm_password_reset
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/refresh", post(auth::refresh))
        .route("/signout", post(auth::signout))
        .route("/me", get(auth::me))
        .route("/password-reset", post(auth::request_password_reset))
        .route(
            "/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
}
