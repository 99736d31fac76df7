//! Transactional booking workflows: create, update, pay and delete.
//!
//! Each workflow runs in one transaction. Every early return drops the
//! transaction, which rolls it back, so a failed request leaves no partial
//! writes behind.

use serde::Serialize;
use serde_json::{json, Value};
use slotbook_core::availability::{self, AvailabilityQuery};
use slotbook_core::booking::{generate_public_code, BookingPlan, BookingRequest, PaymentMethod};
use slotbook_core::client_match::{ClientContact, ClientMatch};
use slotbook_core::error::CoreError;
use slotbook_core::history::{self, HistoryAction, HistoryChanges, HistoryDraft};
use slotbook_core::ledger;
use slotbook_core::types::DbId;
use slotbook_db::models::appointment::{Appointment, PaymentRequest};
use slotbook_db::repositories::{AppointmentRepo, ClientRepo, HistoryRepo, ServiceRepo, ZoneRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

type Tx<'c> = sqlx::Transaction<'c, sqlx::Postgres>;

/// Attempts at drawing a public code that is not taken yet.
const PUBLIC_CODE_ATTEMPTS: usize = 5;

/// Response of create and update.
#[derive(Debug, Serialize)]
pub struct BookingOutcome {
    pub appointment_id: DbId,
    pub public_code: String,
    pub client_id: Option<DbId>,
    pub client_found: bool,
    pub client_created: bool,
}

impl BookingOutcome {
    fn new(appointment: &Appointment, client: ClientMatch) -> Self {
        Self {
            appointment_id: appointment.id,
            public_code: appointment.public_code.clone(),
            client_id: appointment.client_id,
            client_found: client.found,
            client_created: client.created,
        }
    }
}

/// Response of the pay endpoint.
#[derive(Debug, Serialize)]
pub struct PaymentOutcome {
    pub appointment_id: DbId,
    pub is_paid: bool,
    pub payment_method: Option<String>,
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// Create a booking: match the client, lock and verify zones, reject
/// overlaps, write the appointment with its zones and snapshot, post the
/// ledger, refresh visit stats and log history.
pub async fn create(
    state: &AppState,
    req: &BookingRequest,
    actor: Option<DbId>,
) -> AppResult<BookingOutcome> {
    let plan = req.plan()?;
    let mut tx = state.pool.begin().await?;

    let client = match_client(&mut tx, &plan).await?;
    verify_targets(&mut tx, &plan).await?;
    check_overlaps(state, &mut tx, &plan, None).await?;

    let public_code = unused_public_code(&mut tx).await?;
    let appointment =
        AppointmentRepo::insert(&mut tx, &plan, &public_code, client.client_id, actor).await?;
    write_satellites(&mut tx, appointment.id, &plan).await?;
    settle(&mut tx, None, &appointment).await?;

    HistoryRepo::record(
        &mut tx,
        HistoryDraft::new(
            appointment.id,
            plan.branch_id,
            HistoryAction::Create,
            HistoryChanges::created(request_value(req)),
        )
        .by(actor),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        appointment_id = appointment.id,
        branch_id = plan.branch_id,
        client_id = ?appointment.client_id,
        client_created = client.created,
        "Appointment created"
    );
    Ok(BookingOutcome::new(&appointment, client))
}

/// Overwrite a booking with a new request. The branch cannot change; a
/// request without usable contact data keeps the current client.
pub async fn update(
    state: &AppState,
    id: DbId,
    req: &BookingRequest,
    actor: Option<DbId>,
) -> AppResult<BookingOutcome> {
    let plan = req.plan()?;
    let mut tx = state.pool.begin().await?;

    let current = AppointmentRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment", id))?;
    if current.branch_id != plan.branch_id {
        return Err(CoreError::CrossBranch(format!(
            "Appointment {id} belongs to branch {}, not {}",
            current.branch_id, plan.branch_id
        ))
        .into());
    }

    let mut client = match_client(&mut tx, &plan).await?;
    if client.client_id.is_none() {
        client.client_id = current.client_id;
    }

    verify_targets(&mut tx, &plan).await?;
    check_overlaps(state, &mut tx, &plan, Some(id)).await?;

    let updated = AppointmentRepo::update(&mut tx, id, &plan, client.client_id).await?;
    write_satellites(&mut tx, id, &plan).await?;
    settle(&mut tx, Some(&current), &updated).await?;

    let mut drafts = vec![HistoryDraft::new(
        id,
        plan.branch_id,
        HistoryAction::Update,
        HistoryChanges::updated(current.to_history_value(), request_value(req)),
    )];
    if let Some(changes) = history::status_change(&current.status, &updated.status) {
        drafts.push(HistoryDraft::new(
            id,
            plan.branch_id,
            HistoryAction::StatusChange,
            changes,
        ));
    }
    if let Some(changes) = history::service_change(current.service_id, updated.service_id) {
        drafts.push(HistoryDraft::new(
            id,
            plan.branch_id,
            HistoryAction::ServiceChange,
            changes,
        ));
    }
    for draft in drafts {
        HistoryRepo::record(&mut tx, draft.by(actor)).await?;
    }

    tx.commit().await?;

    tracing::info!(
        appointment_id = id,
        branch_id = plan.branch_id,
        client_id = ?updated.client_id,
        "Appointment updated"
    );
    Ok(BookingOutcome::new(&updated, client))
}

/// Record a payment and move the client ledger by the difference.
pub async fn pay(
    state: &AppState,
    id: DbId,
    req: &PaymentRequest,
    actor: Option<DbId>,
) -> AppResult<PaymentOutcome> {
    let (Some(is_paid), Some(method)) = (req.is_paid, req.payment_method.as_deref()) else {
        return Err(CoreError::Validation(
            "is_paid and payment_method are required".to_string(),
        )
        .into());
    };
    let method = PaymentMethod::from_str(method)?;

    let mut tx = state.pool.begin().await?;

    let current = AppointmentRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment", id))?;
    let updated = AppointmentRepo::set_payment(&mut tx, id, is_paid, method.as_str()).await?;
    settle(&mut tx, Some(&current), &updated).await?;

    HistoryRepo::record(
        &mut tx,
        HistoryDraft::new(
            id,
            updated.branch_id,
            HistoryAction::Payment,
            HistoryChanges::updated(payment_value(&current), payment_value(&updated)),
        )
        .by(actor),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        appointment_id = id,
        is_paid,
        payment_method = method.as_str(),
        "Appointment payment recorded"
    );
    Ok(PaymentOutcome {
        appointment_id: id,
        is_paid: updated.is_paid,
        payment_method: updated.payment_method,
    })
}

/// Delete a booking. Ledger totals are left as they are; visit stats of
/// its client are recomputed and the history entry keeps the final state.
pub async fn delete(state: &AppState, id: DbId, actor: Option<DbId>) -> AppResult<DbId> {
    let mut tx = state.pool.begin().await?;

    let current = AppointmentRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment", id))?;
    if !AppointmentRepo::delete(&mut tx, id).await? {
        return Err(AppError::not_found("Appointment", id));
    }

    if let Some(client_id) = current.client_id {
        ClientRepo::recalc_visits(&mut tx, client_id).await?;
    }

    HistoryRepo::record(
        &mut tx,
        HistoryDraft::new(
            id,
            current.branch_id,
            HistoryAction::Delete,
            HistoryChanges::deleted(current.to_history_value()),
        )
        .by(actor),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(appointment_id = id, branch_id = current.branch_id, "Appointment deleted");
    Ok(id)
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

async fn match_client(tx: &mut Tx<'_>, plan: &BookingPlan) -> Result<ClientMatch, sqlx::Error> {
    match plan.client.as_ref().and_then(ClientContact::identity) {
        Some(identity) => ClientRepo::match_or_create(tx, plan.branch_id, &identity).await,
        None => Ok(ClientMatch::default()),
    }
}

/// Lock the requested zones and check they can take the booking, then make
/// sure every referenced service exists.
async fn verify_targets(tx: &mut Tx<'_>, plan: &BookingPlan) -> AppResult<()> {
    let zones = ZoneRepo::lock_for_booking(tx, plan.branch_id, &plan.zone_ids).await?;

    if let Some(missing) = plan
        .zone_ids
        .iter()
        .find(|id| !zones.iter().any(|z| z.id == **id))
    {
        return Err(AppError::not_found("Zone", *missing));
    }
    if let Some(closed) = zones.iter().find(|z| !z.is_booking_available) {
        return Err(CoreError::Validation(format!(
            "Zone {} is not available for booking",
            closed.id
        ))
        .into());
    }

    let missing = ServiceRepo::missing_ids(tx, &plan.totals.service_ids()).await?;
    if let Some(id) = missing.first() {
        return Err(AppError::not_found("Service", *id));
    }
    Ok(())
}

/// Look for overlapping bookings on the locked zones.
async fn check_overlaps(
    state: &AppState,
    tx: &mut Tx<'_>,
    plan: &BookingPlan,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    let query = AvailabilityQuery {
        branch_id: plan.branch_id,
        zone_ids: plan.zone_ids.clone(),
        window: plan.window,
        exclude_id,
    };
    let rows = AppointmentRepo::find_conflicts(&mut **tx, &query).await?;
    let report = availability::check(&query, rows.into_iter().map(Into::into));
    if report.available {
        return Ok(());
    }

    let ids: Vec<String> = report.conflicts.iter().map(|c| c.id.to_string()).collect();
    if state.config.enforce_availability {
        return Err(CoreError::Conflict(format!(
            "Requested zones are already booked by appointment(s) {}",
            ids.join(", ")
        ))
        .into());
    }

    tracing::warn!(
        branch_id = plan.branch_id,
        conflicts = %ids.join(","),
        "Booking overlaps existing appointments"
    );
    Ok(())
}

async fn unused_public_code(tx: &mut Tx<'_>) -> AppResult<String> {
    for _ in 0..PUBLIC_CODE_ATTEMPTS {
        let code = generate_public_code();
        if !AppointmentRepo::public_code_exists(tx, &code).await? {
            return Ok(code);
        }
    }
    Err(CoreError::Internal("Could not allocate a unique public code".to_string()).into())
}

/// Replace zone links and the meta snapshot.
async fn write_satellites(
    tx: &mut Tx<'_>,
    appointment_id: DbId,
    plan: &BookingPlan,
) -> Result<(), sqlx::Error> {
    AppointmentRepo::set_zones(tx, appointment_id, &plan.zone_ids).await?;
    AppointmentRepo::upsert_meta(
        tx,
        appointment_id,
        plan.color.as_deref(),
        &plan.snapshot().to_value(),
    )
    .await
}

/// Post ledger differences between two states of a booking and refresh the
/// visit stats of every client involved.
async fn settle(
    tx: &mut Tx<'_>,
    before: Option<&Appointment>,
    after: &Appointment,
) -> Result<(), sqlx::Error> {
    let before_side = before.map(Appointment::ledger_side);
    for posting in ledger::postings(before_side.as_ref(), &after.ledger_side()) {
        tracing::debug!(
            client_id = posting.client_id,
            amount = %posting.amount,
            "Posting client ledger"
        );
        ClientRepo::apply_posting(tx, &posting).await?;
    }

    for client_id in ledger::touched_clients(before.and_then(|b| b.client_id), after.client_id) {
        ClientRepo::recalc_visits(tx, client_id).await?;
    }
    Ok(())
}

fn request_value(req: &BookingRequest) -> Value {
    serde_json::to_value(req).unwrap_or(Value::Null)
}

fn payment_value(appointment: &Appointment) -> Value {
    json!({
        "is_paid": appointment.is_paid,
        "payment_method": appointment.payment_method,
    })
}
