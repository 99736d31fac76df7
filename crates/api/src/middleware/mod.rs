//! Request extractors.
//!
//! - [`auth::Actor`] -- The optional acting user, taken from a JWT Bearer token.

pub mod auth;
