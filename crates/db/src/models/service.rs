//! Service, zone-link and price-rule models.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use slotbook_core::pricing::{PriceRule, PriceRuleInput};
use slotbook_core::types::{DbId, Money, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from the `services` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Service {
    pub id: DbId,
    pub category_id: DbId,
    pub branch_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub max_participants: Option<i32>,
    pub is_online_available: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `service_prices` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServicePrice {
    pub id: DbId,
    pub service_id: DbId,
    pub zone_id: Option<DbId>,
    pub branch_id: Option<DbId>,
    pub day_type: String,
    pub time_from: Option<NaiveTime>,
    pub time_to: Option<NaiveTime>,
    pub price: Money,
    pub priority: i32,
}

impl From<ServicePrice> for PriceRule {
    fn from(row: ServicePrice) -> Self {
        PriceRule {
            service_id: row.service_id,
            zone_id: row.zone_id,
            branch_id: row.branch_id,
            day_type: row.day_type,
            time_from: row.time_from,
            time_to: row.time_to,
            price: row.price,
            priority: row.priority,
        }
    }
}

/// A service bookable in a zone, with its category name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ZoneService {
    pub id: DbId,
    pub category_id: DbId,
    pub category_name: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub max_participants: Option<i32>,
    pub is_online_available: bool,
}

/// A zone service with the price resolved for the requested context.
#[derive(Debug, Clone, Serialize)]
pub struct PricedService {
    #[serde(flatten)]
    pub service: ZoneService,
    pub price: Option<Money>,
}

/// A service with its zone links and price rules.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub service: Service,
    pub zone_ids: Vec<DbId>,
    pub price_rules: Vec<ServicePrice>,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a service together with its zones and price rules.
#[derive(Debug, Deserialize)]
pub struct CreateService {
    pub category_id: DbId,
    pub branch_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub max_participants: Option<i32>,
    pub is_online_available: Option<bool>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub zone_ids: Vec<DbId>,
    #[serde(default)]
    pub price_rules: Vec<PriceRuleInput>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Input for updating a service. `zone_ids` and `price_rules`, when
/// present, replace the existing sets.
#[derive(Debug, Deserialize)]
pub struct UpdateService {
    pub category_id: Option<DbId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub max_participants: Option<i32>,
    pub is_online_available: Option<bool>,
    pub is_active: Option<bool>,
    pub zone_ids: Option<Vec<DbId>>,
    pub price_rules: Option<Vec<PriceRuleInput>>,
}

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Context for resolving a price: zone, branch, day type or date, time.
#[derive(Debug, Default, Deserialize)]
pub struct PriceContextQuery {
    pub zone_id: Option<DbId>,
    pub branch_id: Option<DbId>,
    pub day_type: Option<String>,
    pub date: Option<chrono::NaiveDate>,
    /// `HH:MM` or `HH:MM:SS`.
    pub time: Option<String>,
}
