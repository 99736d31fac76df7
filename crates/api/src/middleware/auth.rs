//! Optional JWT identification for Axum handlers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use slotbook_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::state::AppState;

/// The user performing a request, if one could be identified.
///
/// Booking endpoints are open; a valid `Authorization: Bearer <token>` only
/// attributes history entries to a user. A missing, malformed or expired
/// token yields `Actor(None)` and never rejects the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor(pub Option<DbId>);

impl Actor {
    pub fn user_id(&self) -> Option<DbId> {
        self.0
    }

    /// Identify the actor from request headers.
    pub fn from_headers(headers: &HeaderMap, config: &JwtConfig) -> Self {
        let Some(token) = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        else {
            return Actor(None);
        };

        match validate_token(token, config) {
            Ok(claims) => Actor(Some(claims.sub)),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
                Actor(None)
            }
        }
    }
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Actor::from_headers(&parts.headers, &state.config.jwt))
    }
}
