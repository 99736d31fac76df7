//! Multi-service price aggregation.
//!
//! A booking carries either a single `service_id` with top-level amounts or a
//! `services` list. Both shapes reduce to the same [`BookingTotals`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Money};

/// One entry of the `services` array as sent by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceLineInput {
    pub service_id: Option<DbId>,
    pub quantity: Option<i32>,
    pub participants: Option<i32>,
    pub final_price: Option<Money>,
    pub prepaid: Option<Money>,
    pub discount: Option<Money>,
}

/// A normalized service line with every default applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLineItem {
    pub service_id: DbId,
    pub quantity: i32,
    pub participants: i32,
    pub final_price: Money,
    pub prepaid: Money,
    pub discount: Money,
}

/// Aggregate amounts for one booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingTotals {
    /// First line's service, stored on the appointment row.
    pub main_service_id: DbId,
    pub quantity: i32,
    pub participants: i32,
    pub final_price: Money,
    pub prepaid: Money,
    pub discount: Money,
    /// `final_price + discount`.
    pub full_price: Money,
    /// `final_price - prepaid`, the amount still to collect.
    pub balance: Money,
    /// Present only when the request used the multi-service shape.
    pub lines: Option<Vec<ServiceLineItem>>,
}

/// Reduce a booking's service data to totals.
///
/// A non-empty `lines` slice takes precedence over `single`. Lines without a
/// `service_id` are dropped; if none survive the request is rejected.
pub fn aggregate(
    single: &ServiceLineInput,
    lines: Option<&[ServiceLineInput]>,
) -> Result<BookingTotals, CoreError> {
    match lines {
        Some(lines) if !lines.is_empty() => {
            let items = lines
                .iter()
                .filter_map(|line| normalize_line(line).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            if items.is_empty() {
                return Err(CoreError::Validation(
                    "services must contain at least one entry with a service_id".to_string(),
                ));
            }
            totals_from(items, true)
        }
        _ => {
            let item = normalize_line(single)?.ok_or_else(|| {
                CoreError::Validation("service_id or services is required".to_string())
            })?;
            totals_from(vec![item], false)
        }
    }
}

/// Apply defaults to one line. Returns `None` when the line has no service.
fn normalize_line(input: &ServiceLineInput) -> Result<Option<ServiceLineItem>, CoreError> {
    let Some(service_id) = input.service_id else {
        return Ok(None);
    };
    Ok(Some(ServiceLineItem {
        service_id,
        quantity: count_or_one(input.quantity, "quantity")?,
        participants: count_or_one(input.participants, "participants")?,
        final_price: amount_or_zero(input.final_price, "final_price")?,
        prepaid: amount_or_zero(input.prepaid, "prepaid")?,
        discount: amount_or_zero(input.discount, "discount")?,
    }))
}

/// Missing or zero counts default to 1.
fn count_or_one(value: Option<i32>, field: &str) -> Result<i32, CoreError> {
    match value {
        None | Some(0) => Ok(1),
        Some(n) if n < 0 => Err(CoreError::Validation(format!(
            "{field} must not be negative"
        ))),
        Some(n) => Ok(n),
    }
}

fn amount_or_zero(value: Option<Money>, field: &str) -> Result<Money, CoreError> {
    match value {
        None => Ok(Decimal::ZERO),
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(CoreError::Validation(format!(
            "{field} must not be negative"
        ))),
        Some(v) if v > max_amount() => Err(CoreError::Validation(format!(
            "{field} must not exceed {}",
            max_amount()
        ))),
        Some(v) => Ok(v),
    }
}

/// Largest amount a `NUMERIC(12,2)` column holds.
fn max_amount() -> Money {
    Decimal::new(999_999_999_999, 2)
}

fn sum_amounts(
    items: &[ServiceLineItem],
    field: &str,
    amount: impl Fn(&ServiceLineItem) -> Money,
) -> Result<Money, CoreError> {
    let total = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(amount(item)))
        .filter(|total| *total <= max_amount());
    total.ok_or_else(|| {
        CoreError::Validation(format!("{field} total must not exceed {}", max_amount()))
    })
}

impl BookingTotals {
    /// Every distinct service referenced by the booking, in line order.
    pub fn service_ids(&self) -> Vec<DbId> {
        let mut ids = match &self.lines {
            Some(lines) => lines.iter().map(|l| l.service_id).collect(),
            None => vec![self.main_service_id],
        };
        let mut seen = Vec::with_capacity(ids.len());
        ids.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
        ids
    }
}

fn totals_from(items: Vec<ServiceLineItem>, keep_lines: bool) -> Result<BookingTotals, CoreError> {
    let main_service_id = items[0].service_id;
    let quantity = items
        .iter()
        .fold(0i32, |acc, i| acc.saturating_add(i.quantity))
        .max(1);
    let participants = items.iter().map(|i| i.participants).max().unwrap_or(1).max(1);
    let final_price = sum_amounts(&items, "final_price", |i| i.final_price)?;
    let prepaid = sum_amounts(&items, "prepaid", |i| i.prepaid)?;
    let discount = sum_amounts(&items, "discount", |i| i.discount)?;

    Ok(BookingTotals {
        main_service_id,
        quantity,
        participants,
        final_price,
        prepaid,
        discount,
        full_price: final_price + discount,
        balance: final_price - prepaid,
        lines: keep_lines.then_some(items),
    })
}
