//! Handlers for appointment history feeds.

use axum::extract::{Path, Query, State};
use axum::Json;
use slotbook_core::history::HistoryAction;
use slotbook_core::types::DbId;
use slotbook_db::models::history::{AppointmentHistory, HistoryQuery};
use slotbook_db::repositories::HistoryRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/appointments/{id}/history
///
/// Works for deleted appointments too.
pub async fn list_for_appointment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<AppointmentHistory>>>> {
    validate_action(&params)?;
    let rows = HistoryRepo::list_for_appointment(&state.pool, id, &params).await?;
    Ok(Json(DataResponse::new(rows)))
}

/// GET /api/v1/branches/{branch_id}/appointment-history
pub async fn list_for_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<AppointmentHistory>>>> {
    validate_action(&params)?;
    let rows = HistoryRepo::list_for_branch(&state.pool, branch_id, &params).await?;
    Ok(Json(DataResponse::new(rows)))
}

fn validate_action(params: &HistoryQuery) -> AppResult<()> {
    if let Some(action) = params.action.as_deref() {
        HistoryAction::from_str(action)?;
    }
    Ok(())
}
