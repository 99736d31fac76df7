//! Service price-rule resolution.
//!
//! A service can carry many price rules scoped by zone, branch, day type and
//! an optional time-of-day window. [`resolve_price`] picks the one that
//! applies to a booking context.
//!
//! Ranking is always highest priority first, then lowest price. When a time
//! is given, rules whose window contains it win. Otherwise every matching
//! rule competes with its window ignored.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Money};

// ---------------------------------------------------------------------------
// Day types
// ---------------------------------------------------------------------------

pub const DAY_TYPE_WEEKDAY: &str = "weekday";
pub const DAY_TYPE_WEEKEND: &str = "weekend";
pub const DAY_TYPE_HOLIDAY: &str = "holiday";

/// All valid day types.
pub const VALID_DAY_TYPES: &[&str] = &[DAY_TYPE_WEEKDAY, DAY_TYPE_WEEKEND, DAY_TYPE_HOLIDAY];

/// Priority given to rules submitted without one.
pub const DEFAULT_RULE_PRIORITY: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayType {
    #[default]
    Weekday,
    Weekend,
    Holiday,
}

impl DayType {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekday => DAY_TYPE_WEEKDAY,
            Self::Weekend => DAY_TYPE_WEEKEND,
            Self::Holiday => DAY_TYPE_HOLIDAY,
        }
    }

    /// Parse from a string, returning an error for unknown day types.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            DAY_TYPE_WEEKDAY => Ok(Self::Weekday),
            DAY_TYPE_WEEKEND => Ok(Self::Weekend),
            DAY_TYPE_HOLIDAY => Ok(Self::Holiday),
            other => Err(CoreError::Validation(format!(
                "Unknown day type: '{other}'. Valid day types: {}",
                VALID_DAY_TYPES.join(", ")
            ))),
        }
    }

    /// Saturday and Sunday are weekend days. Holidays must be requested
    /// explicitly.
    pub fn for_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }

    /// Resolve the day type from an explicit value, else a date, else the
    /// weekday default.
    pub fn resolve(day_type: Option<&str>, date: Option<NaiveDate>) -> Result<Self, CoreError> {
        match (day_type, date) {
            (Some(s), _) => Self::from_str(s),
            (None, Some(d)) => Ok(Self::for_date(d)),
            (None, None) => Ok(Self::default()),
        }
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| CoreError::Validation(format!("Invalid time of day: '{s}'. Expected HH:MM")))
}

// ---------------------------------------------------------------------------
// Rules and queries
// ---------------------------------------------------------------------------

/// One stored price rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRule {
    pub service_id: DbId,
    pub zone_id: Option<DbId>,
    pub branch_id: Option<DbId>,
    pub day_type: String,
    pub time_from: Option<NaiveTime>,
    pub time_to: Option<NaiveTime>,
    pub price: Money,
    pub priority: i32,
}

impl PriceRule {
    fn is_time_scoped(&self) -> bool {
        self.time_from.is_some() || self.time_to.is_some()
    }

    /// `[time_from, time_to)` with missing bounds unconstrained.
    fn covers(&self, time: NaiveTime) -> bool {
        self.time_from.map_or(true, |from| from <= time) && self.time_to.map_or(true, |to| to > time)
    }

    fn applies_to(&self, query: &PriceQuery) -> bool {
        self.service_id == query.service_id
            && self.day_type == query.day_type.as_str()
            && (self.zone_id.is_none() || self.zone_id == query.zone_id)
            && (self.branch_id.is_none() || self.branch_id == query.branch_id)
    }
}

/// The booking context a price is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuery {
    pub service_id: DbId,
    pub zone_id: Option<DbId>,
    pub branch_id: Option<DbId>,
    pub day_type: DayType,
    pub time: Option<NaiveTime>,
}

fn best<'a>(rules: impl Iterator<Item = &'a PriceRule>) -> Option<&'a PriceRule> {
    rules.min_by(|a, b| b.priority.cmp(&a.priority).then(a.price.cmp(&b.price)))
}

/// Pick the applicable price, or `None` if the service is unpriced here.
///
/// With a time, a time-scoped rule whose window covers it wins. Otherwise
/// every candidate competes with its window ignored.
pub fn resolve_price(rules: &[PriceRule], query: &PriceQuery) -> Option<Money> {
    let candidates: Vec<&PriceRule> = rules.iter().filter(|r| r.applies_to(query)).collect();

    if let Some(time) = query.time {
        let in_window = candidates
            .iter()
            .copied()
            .filter(|r| r.is_time_scoped() && r.covers(time));
        if let Some(rule) = best(in_window) {
            return Some(rule.price);
        }
    }

    best(candidates.into_iter()).map(|r| r.price)
}

// ---------------------------------------------------------------------------
// Rule authoring
// ---------------------------------------------------------------------------

/// A price rule as submitted with a service create/update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRuleInput {
    pub zone_id: Option<DbId>,
    pub day_type: Option<String>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub price: Option<Money>,
    pub priority: Option<i32>,
}

/// A validated rule ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRuleDraft {
    pub zone_id: Option<DbId>,
    pub day_type: DayType,
    pub time_from: Option<NaiveTime>,
    pub time_to: Option<NaiveTime>,
    pub price: Money,
    pub priority: i32,
}

/// Clean up submitted rules.
///
/// Rules without a day type or with a non-positive price are skipped.
/// Unknown day types, unparsable times and empty windows are rejected.
pub fn sanitize_price_rules(inputs: &[PriceRuleInput]) -> Result<Vec<PriceRuleDraft>, CoreError> {
    let mut drafts = Vec::with_capacity(inputs.len());
    for input in inputs {
        let Some(day_type) = input.day_type.as_deref().filter(|d| !d.trim().is_empty()) else {
            continue;
        };
        let Some(price) = input.price.filter(|p| p.is_sign_positive() && !p.is_zero()) else {
            continue;
        };

        let day_type = DayType::from_str(day_type.trim())?;
        let time_from = input.time_from.as_deref().map(parse_time_of_day).transpose()?;
        let time_to = input.time_to.as_deref().map(parse_time_of_day).transpose()?;
        if let (Some(from), Some(to)) = (time_from, time_to) {
            if from >= to {
                return Err(CoreError::Validation(format!(
                    "Price rule window {from}..{to} is empty"
                )));
            }
        }

        drafts.push(PriceRuleDraft {
            zone_id: input.zone_id,
            day_type,
            time_from,
            time_to,
            price,
            priority: input.priority.unwrap_or(DEFAULT_RULE_PRIORITY),
        });
    }
    Ok(drafts)
}
