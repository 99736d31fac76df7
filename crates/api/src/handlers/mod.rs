//! Request handlers.
//!
//! Each submodule provides the async handler functions for one resource.
//! Handlers delegate to the repositories in `slotbook_db` (reads) or to
//! [`crate::booking`] (booking mutations) and map errors via
//! [`AppError`](crate::error::AppError).

pub mod appointment;
pub mod client;
pub mod history;
pub mod service;
