//! Booking request validation, time windows and appointment enums.
//!
//! A [`BookingRequest`] is the body shared by create and update. It is
//! turned into a [`BookingPlan`] before any database work starts, so every
//! 400-class failure surfaces before a transaction is opened.

use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::aggregation::{self, BookingTotals, ServiceLineInput};
use crate::client_match::ClientContact;
use crate::error::CoreError;
use crate::ledger::PaymentState;
use crate::snapshot::BookingSnapshot;
use crate::types::{DbId, Money, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_WAITING: &str = "waiting";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_ARRIVED: &str = "arrived";
pub const STATUS_NO_SHOW: &str = "no_show";
pub const STATUS_CANCELLED: &str = "cancelled";

/// All valid appointment statuses.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_WAITING,
    STATUS_CONFIRMED,
    STATUS_ARRIVED,
    STATUS_NO_SHOW,
    STATUS_CANCELLED,
];

/// Statuses that count as a visit in client statistics.
pub const VISIT_STATUSES: &[&str] = &[STATUS_ARRIVED, STATUS_CONFIRMED];

pub const METHOD_CARD: &str = "card";
pub const METHOD_CASH: &str = "cash";

/// Payment methods that move the client ledger.
pub const VALID_PAYMENT_METHODS: &[&str] = &[METHOD_CARD, METHOD_CASH];

/// Calendar color used when a booking is created without one.
pub const DEFAULT_META_COLOR: &str = "#e0f9f3";

/// Length of the customer-facing booking reference.
pub const PUBLIC_CODE_LENGTH: usize = 8;

const PUBLIC_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Waiting,
    Confirmed,
    Arrived,
    NoShow,
    Cancelled,
}

impl AppointmentStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => STATUS_WAITING,
            Self::Confirmed => STATUS_CONFIRMED,
            Self::Arrived => STATUS_ARRIVED,
            Self::NoShow => STATUS_NO_SHOW,
            Self::Cancelled => STATUS_CANCELLED,
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_WAITING => Ok(Self::Waiting),
            STATUS_CONFIRMED => Ok(Self::Confirmed),
            STATUS_ARRIVED => Ok(Self::Arrived),
            STATUS_NO_SHOW => Ok(Self::NoShow),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown appointment status: '{other}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Whether an appointment in this status counts towards visit statistics.
    pub fn counts_as_visit(&self) -> bool {
        VISIT_STATUSES.contains(&self.as_str())
    }
}

/// A payment method that moves the client ledger.
///
/// Anything other than card or cash is stored as NULL and never posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Cash,
}

impl PaymentMethod {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => METHOD_CARD,
            Self::Cash => METHOD_CASH,
        }
    }

    /// Parse from a string, returning an error for unknown methods.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            METHOD_CARD => Ok(Self::Card),
            METHOD_CASH => Ok(Self::Cash),
            other => Err(CoreError::Validation(format!(
                "Unknown payment method: '{other}'. Valid methods: {}",
                VALID_PAYMENT_METHODS.join(", ")
            ))),
        }
    }

    /// Lenient parse used by create/update: unknown methods become `None`.
    pub fn qualifying(s: Option<&str>) -> Option<Self> {
        s.and_then(|s| Self::from_str(s).ok())
    }
}

// ---------------------------------------------------------------------------
// Time window
// ---------------------------------------------------------------------------

/// A half-open `[start, end)` booking interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        if end <= start {
            return Err(CoreError::Validation(
                "end_time must be later than start_time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Length in whole minutes, rounded half-up, never below 1.
    pub fn duration_minutes(&self) -> i32 {
        let millis = (self.end - self.start).num_milliseconds();
        let minutes = ((millis + 30_000) / 60_000).max(1);
        i32::try_from(minutes).unwrap_or(i32::MAX)
    }

    /// Two windows overlap when each starts before the other ends.
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, start: Timestamp, end: Timestamp) -> bool {
        start < self.end && end > self.start
    }
}

/// Generate an 8-character `[0-9A-Z]` booking reference.
pub fn generate_public_code() -> String {
    let mut rng = rand::rng();
    (0..PUBLIC_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..PUBLIC_CODE_ALPHABET.len());
            PUBLIC_CODE_ALPHABET[idx] as char
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Request and plan
// ---------------------------------------------------------------------------

/// Body of `POST /appointments` and `PUT /appointments/{id}`.
///
/// Everything is optional at the serde level so missing fields become a
/// 400 with a readable message instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BookingRequest {
    pub branch_id: Option<DbId>,
    #[serde(default)]
    pub zone_ids: Vec<DbId>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub service_id: Option<DbId>,
    pub services: Option<Vec<ServiceLineInput>>,
    pub participants: Option<i32>,
    pub quantity: Option<i32>,
    pub final_price: Option<Money>,
    pub prepaid: Option<Money>,
    pub discount: Option<Money>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub status: Option<String>,
    #[validate(nested)]
    pub client: Option<ClientContact>,
    #[validate(length(max = 32))]
    pub color: Option<String>,
    pub is_paid: Option<bool>,
    pub payment_method: Option<String>,
}

/// A validated booking, ready to be written.
#[derive(Debug, Clone)]
pub struct BookingPlan {
    pub branch_id: DbId,
    /// Sorted and de-duplicated.
    pub zone_ids: Vec<DbId>,
    pub window: TimeWindow,
    pub totals: BookingTotals,
    pub status: AppointmentStatus,
    pub payment: PaymentState,
    pub comment: Option<String>,
    pub color: Option<String>,
    pub client: Option<ClientContact>,
}

impl BookingRequest {
    /// Validate the request and compute totals.
    pub fn plan(&self) -> Result<BookingPlan, CoreError> {
        self.validate()?;

        let branch_id = self
            .branch_id
            .ok_or_else(|| CoreError::Validation("branch_id is required".to_string()))?;

        let zone_ids = normalize_zone_ids(&self.zone_ids)?;

        let (start, end) = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(CoreError::Validation(
                    "start_time and end_time are required".to_string(),
                ))
            }
        };
        let window = TimeWindow::new(start, end)?;

        let single = ServiceLineInput {
            service_id: self.service_id,
            quantity: self.quantity,
            participants: self.participants,
            final_price: self.final_price,
            prepaid: self.prepaid,
            discount: self.discount,
        };
        let totals = aggregation::aggregate(&single, self.services.as_deref())?;

        let status = match self.status.as_deref() {
            Some(s) => AppointmentStatus::from_str(s)?,
            None => AppointmentStatus::Waiting,
        };

        let payment = PaymentState {
            is_paid: self.is_paid.unwrap_or(false),
            method: PaymentMethod::qualifying(self.payment_method.as_deref()),
            price: totals.final_price,
        };

        let color = self
            .color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(BookingPlan {
            branch_id,
            zone_ids,
            window,
            totals,
            status,
            payment,
            comment: self.comment.clone(),
            color,
            client: self.client.clone(),
        })
    }
}

impl BookingPlan {
    /// The denormalized record stored in `appointment_meta.extra`.
    pub fn snapshot(&self) -> BookingSnapshot {
        BookingSnapshot::from_totals(self.client.clone(), &self.totals)
    }
}

/// Reject an empty zone list, then sort and de-duplicate.
pub fn normalize_zone_ids(zone_ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
    if zone_ids.is_empty() {
        return Err(CoreError::Validation(
            "zone_ids must contain at least one zone".to_string(),
        ));
    }
    let mut ids = zone_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
