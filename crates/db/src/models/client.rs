//! Client models.

use serde::{Deserialize, Serialize};
use slotbook_core::types::{DbId, Money, Timestamp};
use sqlx::FromRow;

/// A row from the `clients` table, including ledger totals and visit stats.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Client {
    pub id: DbId,
    pub branch_id: DbId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub spent: Money,
    pub paid: Money,
    pub discount: Option<Money>,
    pub first_visit: Option<Timestamp>,
    pub last_visit: Option<Timestamp>,
    pub visits_count: i32,
    pub comment: Option<String>,
    pub agreed_to_mailing: bool,
    pub agreed_to_personal_data: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Query parameters for listing a branch's clients.
#[derive(Debug, Deserialize)]
pub struct ClientListParams {
    pub branch_id: DbId,
    /// Substring match on name, phone or email.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
