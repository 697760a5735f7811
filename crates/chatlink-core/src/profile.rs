//! User profile documents

use std::collections::BTreeSet;
use std::str::FromStr;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::errors::{ChatlinkError, Result};
use crate::relationship::RelationshipStatus;
use crate::store::RelationshipField;
use crate::types::{Timestamp, UserId};

// ----------------------------------------------------------------------------
// Profile Document
// ----------------------------------------------------------------------------

/// A user's profile document, including the three relationship sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    /// URL returned by the media host
    #[serde(default)]
    pub avatar: Option<String>,
    /// Symmetric: A ∈ B.friends ⇔ B ∈ A.friends
    #[serde(default)]
    pub friends: BTreeSet<UserId>,
    /// Users who asked this user to connect
    #[serde(default)]
    pub incoming_requests: BTreeSet<UserId>,
    /// Users this user asked to connect
    #[serde(default)]
    pub sent_requests: BTreeSet<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserProfile {
    /// Fresh profile with empty relationship sets
    pub fn new(id: UserId, name: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            bio: None,
            location: None,
            country: None,
            phone: None,
            birth_date: None,
            avatar: None,
            friends: BTreeSet::new(),
            incoming_requests: BTreeSet::new(),
            sent_requests: BTreeSet::new(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Builder-style email setter
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Relationship of this user towards `counterpart`, as seen from this document
    pub fn relationship_with(&self, counterpart: &UserId) -> RelationshipStatus {
        RelationshipStatus::derive(self, counterpart)
    }

    /// Mutable access to one of the relationship sets
    pub fn relationship_set_mut(&mut self, field: RelationshipField) -> &mut BTreeSet<UserId> {
        match field {
            RelationshipField::Friends => &mut self.friends,
            RelationshipField::IncomingRequests => &mut self.incoming_requests,
            RelationshipField::SentRequests => &mut self.sent_requests,
        }
    }

    /// Read access to one of the relationship sets
    pub fn relationship_set(&self, field: RelationshipField) -> &BTreeSet<UserId> {
        match field {
            RelationshipField::Friends => &self.friends,
            RelationshipField::IncomingRequests => &self.incoming_requests,
            RelationshipField::SentRequests => &self.sent_requests,
        }
    }

    /// Whether `counterpart` appears in any relationship set
    pub fn is_connected_to(&self, counterpart: &UserId) -> bool {
        self.friends.contains(counterpart)
            || self.incoming_requests.contains(counterpart)
            || self.sent_requests.contains(counterpart)
    }

    /// Case-insensitive substring match on the display name
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.name.to_lowercase().contains(&query.to_lowercase())
    }

    /// Apply an owner-initiated field update
    pub fn apply_update(&mut self, update: &ProfileUpdate, now: Timestamp) -> Result<()> {
        update.validate()?;

        let fields: [(&Option<String>, &mut Option<String>); 6] = [
            (&update.email, &mut self.email),
            (&update.bio, &mut self.bio),
            (&update.location, &mut self.location),
            (&update.country, &mut self.country),
            (&update.phone, &mut self.phone),
            (&update.birth_date, &mut self.birth_date),
        ];
        for (new, current) in fields {
            if let Some(value) = new {
                *current = normalize(value);
            }
        }
        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }

        self.updated_at = now;
        Ok(())
    }
}

/// Blank strings clear a field
fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ----------------------------------------------------------------------------
// Profile Update
// ----------------------------------------------------------------------------

/// Owner-writable profile fields
///
/// `None` leaves a field untouched; `Some("")` clears it. The avatar and the
/// relationship sets are written through their own paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Reject malformed values before they reach the store
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ChatlinkError::validation("name", "must not be empty"));
            }
        }
        if let Some(email) = &self.email {
            let email = email.trim();
            if !email.is_empty() {
                EmailAddress::from_str(email)
                    .map_err(|e| ChatlinkError::validation("email", e.to_string()))?;
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str) -> UserProfile {
        UserProfile::new(UserId::new(id).unwrap(), name, Timestamp::new(1))
    }

    #[test]
    fn test_apply_update() {
        let mut p = profile("u1", "Ali Raza");
        let update = ProfileUpdate {
            bio: Some("  Flutter dev ".into()),
            country: Some("PK".into()),
            ..Default::default()
        };
        p.apply_update(&update, Timestamp::new(9)).unwrap();
        assert_eq!(p.bio.as_deref(), Some("Flutter dev"));
        assert_eq!(p.country.as_deref(), Some("PK"));
        assert_eq!(p.name, "Ali Raza");
        assert_eq!(p.updated_at, Timestamp::new(9));

        let clear = ProfileUpdate {
            bio: Some("".into()),
            ..Default::default()
        };
        p.apply_update(&clear, Timestamp::new(10)).unwrap();
        assert!(p.bio.is_none());
    }

    #[test]
    fn test_update_validation() {
        let mut p = profile("u1", "Ali");
        let bad_email = ProfileUpdate {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(p.apply_update(&bad_email, Timestamp::new(2)).is_err());
        assert_eq!(p.updated_at, Timestamp::new(1));

        let blank_name = ProfileUpdate {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let p = profile("u3", "Ayesha Khan");
        assert!(p.matches_search("khan"));
        assert!(p.matches_search("AYE"));
        assert!(p.matches_search(""));
        assert!(!p.matches_search("hamza"));
    }

    #[test]
    fn test_document_field_names() {
        let mut p = profile("u1", "Zainab");
        p.incoming_requests.insert(UserId::new("u2").unwrap());
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("incomingRequests").is_some());
        assert!(json.get("sentRequests").is_some());
        assert!(json.get("birthDate").is_some());

        let back: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
