//! Route definitions for the `/appointments` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{appointment, history};
use crate::state::AppState;

/// Routes mounted at `/appointments`.
///
/// ```text
/// POST   /                 -> create
/// POST   /check            -> check
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// DELETE /{id}             -> delete
/// POST   /{id}/pay         -> pay
/// GET    /{id}/history     -> list_for_appointment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(appointment::create))
        .route("/check", post(appointment::check))
        .route(
            "/{id}",
            get(appointment::get_by_id)
                .put(appointment::update)
                .delete(appointment::delete),
        )
        .route("/{id}/pay", post(appointment::pay))
        .route("/{id}/history", get(history::list_for_appointment))
}
