pub mod appointments;
pub mod branches;
pub mod clients;
pub mod health;
pub mod services;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /appointments                                    create (POST)
/// /appointments/check                              availability check (POST)
/// /appointments/{id}                               get, update, delete
/// /appointments/{id}/pay                           record payment (POST)
/// /appointments/{id}/history                       history (GET)
///
/// /branches/{branch_id}/appointments               journal (?date=YYYY-MM-DD)
/// /branches/{branch_id}/appointment-history        history feed (?action, limit, offset)
/// /branches/{branch_id}/zones/{zone_id}/services   services with price (?day_type, date, time)
///
/// /services                                        create (POST)
/// /services/{id}                                   get, update
/// /services/{id}/prices                            price rules (GET)
/// /services/{id}/price                             price lookup (?zone_id, branch_id, day_type, date, time)
///
/// /clients                                         list (?branch_id, search, limit, offset)
/// /clients/{id}                                    get
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/appointments", appointments::router())
        .nest("/branches", branches::router())
        .nest("/services", services::router())
        .nest("/clients", clients::router())
}
