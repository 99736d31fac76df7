//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Read-side views joined across tables where handlers need them
//! - `Deserialize` create/update DTOs where the API accepts writes

pub mod appointment;
pub mod client;
pub mod history;
pub mod service;
pub mod zone;
