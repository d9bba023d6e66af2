//! Route definitions for the `/customizations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::customization;
use crate::state::AppState;

/// Routes mounted at `/customizations`. Writes live under `/admin`.
///
/// ```text
/// GET /    -> list_customizations
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(customization::list_customizations))
}
