//! Zone rows. Zones are managed elsewhere; bookings only read and lock them.

use chrono::NaiveTime;
use serde::Serialize;
use slotbook_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `zones` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Zone {
    pub id: DbId,
    pub branch_id: DbId,
    pub name: String,
    pub capacity: Option<i32>,
    pub can_merge: bool,
    pub is_booking_available: bool,
    pub working_from: Option<NaiveTime>,
    pub working_to: Option<NaiveTime>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
