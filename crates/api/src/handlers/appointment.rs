//! Handlers for the `/appointments` resource and the branch journal.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use slotbook_core::availability::{self, AvailabilityReport, AvailabilityRequest};
use slotbook_core::booking::BookingRequest;
use slotbook_core::types::DbId;
use slotbook_db::models::appointment::{AppointmentView, JournalQuery, PaymentRequest};
use slotbook_db::repositories::AppointmentRepo;

use crate::booking::{self, BookingOutcome, PaymentOutcome};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Actor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeletedAppointment {
    pub appointment_id: DbId,
}

/// POST /api/v1/appointments
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<BookingRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<BookingOutcome>>)> {
    let outcome = booking::create(&state, &input, actor.user_id()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(outcome))))
}

/// GET /api/v1/appointments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AppointmentView>>> {
    let view = AppointmentRepo::find_view(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment", id))?;
    Ok(Json(DataResponse::new(view)))
}

/// PUT /api/v1/appointments/{id}
pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<DbId>,
    Json(input): Json<BookingRequest>,
) -> AppResult<Json<DataResponse<BookingOutcome>>> {
    let outcome = booking::update(&state, id, &input, actor.user_id()).await?;
    Ok(Json(DataResponse::new(outcome)))
}

/// DELETE /api/v1/appointments/{id}
pub async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeletedAppointment>>> {
    let appointment_id = booking::delete(&state, id, actor.user_id()).await?;
    Ok(Json(DataResponse::new(DeletedAppointment { appointment_id })))
}

/// POST /api/v1/appointments/{id}/pay
pub async fn pay(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<DbId>,
    Json(input): Json<PaymentRequest>,
) -> AppResult<Json<DataResponse<PaymentOutcome>>> {
    let outcome = booking::pay(&state, id, &input, actor.user_id()).await?;
    Ok(Json(DataResponse::new(outcome)))
}

/// POST /api/v1/appointments/check
///
/// Read-only; nothing is locked, so the answer can be stale by the time a
/// booking is submitted. Create and update re-check under lock.
pub async fn check(
    State(state): State<AppState>,
    Json(input): Json<AvailabilityRequest>,
) -> AppResult<Json<DataResponse<AvailabilityReport>>> {
    let query = input.query()?;
    let rows = AppointmentRepo::find_conflicts(&state.pool, &query).await?;
    let report = availability::check(&query, rows.into_iter().map(Into::into));

    tracing::debug!(
        branch_id = query.branch_id,
        available = report.available,
        conflicts = report.conflicts.len(),
        "Availability checked"
    );
    Ok(Json(DataResponse::new(report)))
}

/// GET /api/v1/branches/{branch_id}/appointments
pub async fn list_by_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<DbId>,
    Query(params): Query<JournalQuery>,
) -> AppResult<Json<DataResponse<Vec<AppointmentView>>>> {
    let rows = AppointmentRepo::list_journal(&state.pool, branch_id, params.date).await?;
    Ok(Json(DataResponse::new(rows)))
}
