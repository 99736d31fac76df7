//! Handlers for the `/clients` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use slotbook_core::types::DbId;
use slotbook_db::models::client::{Client, ClientListParams};
use slotbook_db::repositories::ClientRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/clients?branch_id=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ClientListParams>,
) -> AppResult<Json<DataResponse<Vec<Client>>>> {
    let clients = ClientRepo::list_by_branch(
        &state.pool,
        params.branch_id,
        params.search.as_deref(),
        params.limit,
        params.offset,
    )
    .await?;
    Ok(Json(DataResponse::new(clients)))
}

/// GET /api/v1/clients/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Client>>> {
    let client = ClientRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Client", id))?;
    Ok(Json(DataResponse::new(client)))
}
