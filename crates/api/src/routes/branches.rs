//! Branch-scoped read routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::{appointment, history, service};
use crate::state::AppState;

/// Routes mounted at `/branches`.
///
/// ```text
/// GET    /{branch_id}/appointments                 -> list_by_branch
/// GET    /{branch_id}/appointment-history          -> list_for_branch
/// GET    /{branch_id}/zones/{zone_id}/services     -> list_for_zone
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{branch_id}/appointments", get(appointment::list_by_branch))
        .route(
            "/{branch_id}/appointment-history",
            get(history::list_for_branch),
        )
        .route(
            "/{branch_id}/zones/{zone_id}/services",
            get(service::list_for_zone),
        )
}
