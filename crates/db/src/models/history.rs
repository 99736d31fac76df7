use serde::{Deserialize, Serialize};
use slotbook_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `appointment_history` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AppointmentHistory {
    pub id: DbId,
    pub appointment_id: DbId,
    pub branch_id: Option<DbId>,
    pub action: String,
    pub user_id: Option<DbId>,
    pub changes: serde_json::Value,
    pub source: String,
    pub changed_at: Timestamp,
}

/// Query parameters for history listings.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub action: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
