//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! take `&PgPool`; steps of a booking mutation take the caller's
//! `&mut Transaction` so the whole mutation commits or rolls back together.

pub mod appointment_repo;
pub mod client_repo;
pub mod history_repo;
pub mod service_repo;
pub mod zone_repo;

pub use appointment_repo::AppointmentRepo;
pub use client_repo::ClientRepo;
pub use history_repo::HistoryRepo;
pub use service_repo::ServiceRepo;
pub use zone_repo::ZoneRepo;
