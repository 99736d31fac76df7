//! Client ledger postings.
//!
//! A booking contributes its price to the client's `paid` and `spent` totals
//! while it is paid by card or cash. Every mutation compares the contribution
//! before and after and posts the difference.

use rust_decimal::Decimal;

use crate::booking::PaymentMethod;
use crate::types::{DbId, Money};

/// Payment columns of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentState {
    pub is_paid: bool,
    /// `None` for unpaid bookings and for methods that never post.
    pub method: Option<PaymentMethod>,
    pub price: Money,
}

impl PaymentState {
    /// Amount this booking currently contributes to the client ledger.
    pub fn contribution(&self) -> Money {
        if self.is_paid && self.method.is_some() {
            self.price
        } else {
            Decimal::ZERO
        }
    }
}

/// Who a booking belongs to and how it is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSide {
    pub client_id: Option<DbId>,
    pub payment: PaymentState,
}

/// A signed adjustment to one client's `paid` and `spent` totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPosting {
    pub client_id: DbId,
    pub amount: Money,
}

/// Compute the postings that move the ledger from `before` to `after`.
///
/// `before` is `None` for a new booking. When the client changes, the old
/// client's contribution is reversed and the new client's is posted.
pub fn postings(before: Option<&LedgerSide>, after: &LedgerSide) -> Vec<LedgerPosting> {
    let mut out = Vec::with_capacity(2);
    let after_amount = after.payment.contribution();

    let before = before.and_then(|b| b.client_id.map(|id| (id, b.payment.contribution())));

    match (before, after.client_id) {
        (Some((prev_id, prev_amount)), Some(next_id)) if prev_id == next_id => {
            push_nonzero(&mut out, next_id, after_amount - prev_amount);
        }
        (prev, next) => {
            if let Some((prev_id, prev_amount)) = prev {
                push_nonzero(&mut out, prev_id, -prev_amount);
            }
            if let Some(next_id) = next {
                push_nonzero(&mut out, next_id, after_amount);
            }
        }
    }
    out
}

fn push_nonzero(out: &mut Vec<LedgerPosting>, client_id: DbId, amount: Money) {
    if !amount.is_zero() {
        out.push(LedgerPosting { client_id, amount });
    }
}

/// Clients whose visit statistics must be recomputed after a mutation.
pub fn touched_clients(before: Option<DbId>, after: Option<DbId>) -> Vec<DbId> {
    let mut ids: Vec<DbId> = before.into_iter().chain(after).collect();
    ids.dedup();
    ids
}
