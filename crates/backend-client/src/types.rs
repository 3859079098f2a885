//! Data model shared across the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User UUID from the auth backend
    pub id: Uuid,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session. The backend owns the credential; this is the
/// client's cached, possibly-stale copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token presented on every authenticated call
    pub access_token: String,
    /// Token used to mint a replacement session
    pub refresh_token: String,
    /// End of the token validity window
    pub expires_at: DateTime<Utc>,
    /// The user this session is bound to
    pub user: User,
}

impl Session {
    /// True when the access token is within 60 seconds of expiry.
    pub fn is_expired(&self) -> bool {
        (self.expires_at - Utc::now()).num_seconds() < 60
    }
}

/// A tenant: the restaurant account owning a set of inventory items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization UUID
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// URL-safe slug, globally unique
    pub slug: String,
}

/// The link granting a user access to an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Membership row id; the ascending order key for the deterministic
    /// pick when a user somehow holds more than one membership
    pub id: i64,
    /// Member user UUID
    pub user_id: Uuid,
    /// Organization UUID
    pub organization_id: Uuid,
    /// Role within the organization (e.g., "owner")
    pub role: String,
}

/// One inventory row, scoped to an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Row id
    pub id: i64,
    /// Item name
    pub name: String,
    /// Free-text category
    pub category: String,
    /// On-hand quantity, never displayed below zero
    pub quantity: f64,
    /// Free-text unit ("lbs", "bottles", ...)
    pub unit: String,
    /// Minimum stock threshold
    pub min_stock: f64,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// Owning organization UUID
    pub organization_id: Uuid,
}

/// Fields for a new or edited inventory item.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub min_stock: f64,
}

/// Outcome of a sign-up call.
///
/// Depending on project settings the backend either opens a session
/// immediately or sends a confirmation email first.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// Auto-confirm project: signed in right away
    SessionCreated(Session),
    /// Confirmation email sent; the user signs in after clicking it
    ConfirmationRequired {
        /// Address the confirmation mail went to
        email: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User {
            id: Uuid::nil(),
            email: Some("a@x.com".to_string()),
        }
    }

    #[test]
    fn session_expired_in_the_past() {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: Utc::now() - Duration::hours(1),
            user: user(),
        };
        assert!(session.is_expired());
    }

    #[test]
    fn session_expiring_within_leeway_counts_as_expired() {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: Utc::now() + Duration::seconds(30),
            user: user(),
        };
        assert!(session.is_expired());
    }

    #[test]
    fn session_valid_beyond_leeway() {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: user(),
        };
        assert!(!session.is_expired());
    }

    #[test]
    fn inventory_record_deserializes_from_row_json() {
        let json = r#"{
            "id": 3,
            "name": "Olive Oil",
            "category": "Pantry",
            "quantity": 8.0,
            "unit": "bottles",
            "min_stock": 5.0,
            "updated_at": "2026-01-15T10:30:00Z",
            "organization_id": "00000000-0000-0000-0000-000000000000"
        }"#;

        let record: InventoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Olive Oil");
        assert_eq!(record.quantity, 8.0);
        assert_eq!(record.min_stock, 5.0);
    }
}
