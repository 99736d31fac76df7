//! Route definitions for the `/services` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::service;
use crate::state::AppState;

/// Routes mounted at `/services`.
///
/// ```text
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// GET    /{id}/prices      -> list_prices
/// GET    /{id}/price       -> resolve_price
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(service::create))
        .route("/{id}", get(service::get_by_id).put(service::update))
        .route("/{id}/prices", get(service::list_prices))
        .route("/{id}/price", get(service::resolve_price))
}
