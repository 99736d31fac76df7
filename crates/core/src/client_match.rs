//! Contact normalization for matching bookings to clients.
//!
//! Lookup itself happens in the `db` crate; this module decides which key to
//! search by and what a newly created client looks like.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::DbId;

/// Name stored for clients created without one.
pub const DEFAULT_CLIENT_NAME: &str = "No name";

/// Client contact block embedded in a booking request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClientContact {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
}

/// The field a client lookup is keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKey {
    /// Digits-only phone number.
    Phone(String),
    /// Trimmed email, compared exactly.
    Email(String),
}

/// Normalized contact data, ready for lookup or insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub key: MatchKey,
}

/// Result of matching a booking to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClientMatch {
    pub client_id: Option<DbId>,
    pub found: bool,
    pub created: bool,
}

impl ClientMatch {
    pub fn found(client_id: DbId) -> Self {
        Self {
            client_id: Some(client_id),
            found: true,
            created: false,
        }
    }

    pub fn created(client_id: DbId) -> Self {
        Self {
            client_id: Some(client_id),
            found: false,
            created: true,
        }
    }
}

/// Strip everything but ASCII digits. An empty result means no phone.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

fn trimmed(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ClientContact {
    /// Normalize the contact. Returns `None` when neither a phone nor an
    /// email is usable, in which case the booking proceeds without a client.
    pub fn identity(&self) -> Option<ClientIdentity> {
        let phone = self.phone.as_deref().and_then(normalize_phone);
        let email = trimmed(self.email.as_deref());
        let name = trimmed(self.name.as_deref()).unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());

        let key = match (&phone, &email) {
            (Some(p), _) => MatchKey::Phone(p.clone()),
            (None, Some(e)) => MatchKey::Email(e.clone()),
            (None, None) => return None,
        };

        Some(ClientIdentity {
            name,
            phone,
            email,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: Option<&str>, phone: Option<&str>, email: Option<&str>) -> ClientContact {
        ClientContact {
            name: name.map(Into::into),
            phone: phone.map(Into::into),
            email: email.map(Into::into),
        }
    }

    #[test]
    fn phone_is_reduced_to_digits() {
        assert_eq!(
            normalize_phone("+7 (900) 111-22-33").as_deref(),
            Some("79001112233")
        );
        assert_eq!(normalize_phone(" + - "), None);
        assert_eq!(normalize_phone(""), None);
    }

    #[test]
    fn phone_wins_over_email() {
        let id = contact(None, Some("8-900-1"), Some("a@b.c")).identity().unwrap();
        assert_eq!(id.key, MatchKey::Phone("89001".into()));
        assert_eq!(id.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn email_used_when_phone_has_no_digits() {
        let id = contact(Some(" Ann "), Some("+"), Some("  ann@example.com "))
            .identity()
            .unwrap();
        assert_eq!(id.key, MatchKey::Email("ann@example.com".into()));
        assert_eq!(id.phone, None);
        assert_eq!(id.name, "Ann");
    }

    #[test]
    fn missing_name_gets_default() {
        let id = contact(Some("   "), Some("123"), None).identity().unwrap();
        assert_eq!(id.name, DEFAULT_CLIENT_NAME);
    }

    #[test]
    fn no_contact_means_no_identity() {
        assert_eq!(contact(Some("Bob"), None, None).identity(), None);
        assert_eq!(contact(None, Some(""), Some("  ")).identity(), None);
    }
}
