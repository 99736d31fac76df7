//! Bearer-token decoding.
//!
//! Tokens are HS256-signed JWTs issued elsewhere. The booking service only
//! reads the subject to attribute history entries to a user.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use slotbook_core::types::DbId;

/// The claims the booking service reads from a token.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// The acting user's id.
    pub sub: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret tokens are verified with.
    pub secret: String,
}

impl JwtConfig {
    /// Load the verification secret from `JWT_SECRET`.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");
        Self { secret }
    }
}

/// Verify the signature and expiry of a token and return its claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
