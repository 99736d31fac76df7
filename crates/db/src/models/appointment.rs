//! Appointment models: the `appointments` row, its meta record, and the
//! joined view used by the journal and detail endpoints.

use serde::{Deserialize, Serialize};
use slotbook_core::availability::BookedSlot;
use slotbook_core::booking::PaymentMethod;
use slotbook_core::ledger::{LedgerSide, PaymentState};
use slotbook_core::types::{DbId, Money, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `appointments` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Appointment {
    pub id: DbId,
    pub public_code: String,
    pub branch_id: DbId,
    pub client_id: Option<DbId>,
    pub created_by: Option<DbId>,
    pub service_id: Option<DbId>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub duration_minutes: i32,
    pub participants_count: i32,
    pub price: Money,
    pub prepayment: Money,
    pub status: String,
    pub is_paid: bool,
    pub payment_method: Option<String>,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Appointment {
    /// The stored row as a ledger input.
    pub fn ledger_side(&self) -> LedgerSide {
        LedgerSide {
            client_id: self.client_id,
            payment: PaymentState {
                is_paid: self.is_paid,
                method: PaymentMethod::qualifying(self.payment_method.as_deref()),
                price: self.price,
            },
        }
    }

    /// JSON copy of the row for history `before` payloads.
    pub fn to_history_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A row from the `appointment_meta` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AppointmentMeta {
    pub appointment_id: DbId,
    pub color: String,
    pub category: Option<String>,
    pub extra: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// An appointment joined with its client, main service, zones and meta.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AppointmentView {
    pub id: DbId,
    pub public_code: String,
    pub branch_id: DbId,
    pub client_id: Option<DbId>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub service_id: Option<DbId>,
    pub service_name: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub duration_minutes: i32,
    pub participants_count: i32,
    pub price: Money,
    pub prepayment: Money,
    pub status: String,
    pub is_paid: bool,
    pub payment_method: Option<String>,
    pub comment: Option<String>,
    pub zone_ids: Vec<DbId>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub extra: Option<serde_json::Value>,
}

/// An overlapping booking as returned by the conflict query.
#[derive(Debug, Clone, FromRow)]
pub struct ConflictRow {
    pub id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub zone_ids: Vec<DbId>,
}

impl From<ConflictRow> for BookedSlot {
    fn from(row: ConflictRow) -> Self {
        BookedSlot {
            id: row.id,
            start_time: row.start_time,
            end_time: row.end_time,
            zone_ids: row.zone_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /appointments/{id}/pay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub is_paid: Option<bool>,
    pub payment_method: Option<String>,
}

/// Query parameters for the branch journal.
#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    /// `YYYY-MM-DD`; without it the latest bookings are returned.
    pub date: Option<chrono::NaiveDate>,
}
