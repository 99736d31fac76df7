//! Access-token primitives.
//!
//! - [`jwt`] -- bearer-token verification.

pub mod jwt;
