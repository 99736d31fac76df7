//! Domain logic for the booking backend.
//!
//! Everything here is pure: no I/O, no database types. The `db` and `api`
//! crates call into these modules for validation, pricing, ledger and
//! availability decisions.

pub mod aggregation;
pub mod availability;
pub mod booking;
pub mod client_match;
pub mod error;
pub mod history;
pub mod ledger;
pub mod pricing;
pub mod snapshot;
pub mod types;
