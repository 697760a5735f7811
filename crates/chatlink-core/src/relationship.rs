//! Friend relationship state machine
//!
//! A relationship between two users lives in six sets spread over two
//! documents. This module collapses what one document says about a counterpart
//! into a single [`RelationshipStatus`], validates user actions against it, and
//! plans the [`WriteBatch`] that moves both documents to the next state in one
//! atomic commit.
//!
//! Preconditions are checked against the actor's last read of their own
//! document. Nothing re-reads the counterpart or re-validates right before the
//! commit, so two clients racing on the same pair can still interleave.

use core::fmt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::RelationshipError;
use crate::profile::UserProfile;
use crate::store::{RelationshipField, WriteBatch};
use crate::types::UserId;

// ----------------------------------------------------------------------------
// Relationship Status
// ----------------------------------------------------------------------------

/// Relationship of an actor towards one counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipStatus {
    /// Not connected
    None,
    /// The actor asked the counterpart to connect
    PendingOutgoing,
    /// The counterpart asked the actor to connect
    PendingIncoming,
    /// Connected
    Friends,
}

impl RelationshipStatus {
    /// Derive the status from the actor's document
    ///
    /// A document violating mutual exclusion resolves to the most advanced
    /// state (friends, then incoming, then outgoing).
    pub fn derive(actor: &UserProfile, counterpart: &UserId) -> Self {
        let friends = actor.friends.contains(counterpart);
        let incoming = actor.incoming_requests.contains(counterpart);
        let outgoing = actor.sent_requests.contains(counterpart);

        if [friends, incoming, outgoing].iter().filter(|set| **set).count() > 1 {
            warn!(
                actor = %actor.id,
                counterpart = %counterpart,
                friends,
                incoming,
                outgoing,
                "relationship sets overlap for one counterpart"
            );
        }

        if friends {
            Self::Friends
        } else if incoming {
            Self::PendingIncoming
        } else if outgoing {
            Self::PendingOutgoing
        } else {
            Self::None
        }
    }

    /// State reached by applying `action`, or `None` if the action is not allowed
    pub fn transition(self, action: RelationshipAction) -> Option<Self> {
        match (self, action) {
            (Self::None, RelationshipAction::SendRequest) => Some(Self::PendingOutgoing),
            (Self::PendingIncoming, RelationshipAction::Accept) => Some(Self::Friends),
            (Self::PendingIncoming, RelationshipAction::Reject) => Some(Self::None),
            _ => None,
        }
    }

    /// Whether a request is waiting in either direction
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingIncoming | Self::PendingOutgoing)
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "not connected",
            Self::PendingOutgoing => "pending outgoing",
            Self::PendingIncoming => "pending incoming",
            Self::Friends => "friends",
        };
        f.write_str(label)
    }
}

// ----------------------------------------------------------------------------
// Relationship Actions
// ----------------------------------------------------------------------------

/// User-initiated relationship actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipAction {
    SendRequest,
    Accept,
    Reject,
}

impl fmt::Display for RelationshipAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SendRequest => "send request",
            Self::Accept => "accept request",
            Self::Reject => "reject request",
        };
        f.write_str(label)
    }
}

impl RelationshipAction {
    /// Validate the action against the actor's document and plan the batch
    ///
    /// Returns the batch together with the status the actor will be in once it
    /// commits.
    pub fn plan(
        self,
        actor: &UserProfile,
        counterpart: &UserId,
    ) -> Result<(WriteBatch, RelationshipStatus), RelationshipError> {
        if &actor.id == counterpart {
            return Err(RelationshipError::SelfRelationship { action: self });
        }

        let status = actor.relationship_with(counterpart);
        let next = status
            .transition(self)
            .ok_or_else(|| RelationshipError::InvalidTransition {
                counterpart: counterpart.to_string(),
                status,
                action: self,
            })?;

        let me = &actor.id;
        let mut batch = WriteBatch::new();
        match self {
            RelationshipAction::SendRequest => {
                batch
                    .union(me, RelationshipField::SentRequests, counterpart)
                    .union(counterpart, RelationshipField::IncomingRequests, me);
            }
            RelationshipAction::Accept => {
                batch
                    .union(me, RelationshipField::Friends, counterpart)
                    .remove(me, RelationshipField::IncomingRequests, counterpart)
                    .remove(me, RelationshipField::SentRequests, counterpart)
                    .union(counterpart, RelationshipField::Friends, me)
                    .remove(counterpart, RelationshipField::SentRequests, me)
                    .remove(counterpart, RelationshipField::IncomingRequests, me);
            }
            RelationshipAction::Reject => {
                batch
                    .remove(me, RelationshipField::IncomingRequests, counterpart)
                    .remove(counterpart, RelationshipField::SentRequests, me);
            }
        }

        Ok((batch, next))
    }
}

// ----------------------------------------------------------------------------
// Derived Views
// ----------------------------------------------------------------------------

/// Profiles the actor has no relationship with yet
///
/// Everything in `all` minus the actor, their friends, and both directions of
/// pending requests. Recomputed on every call; never stored.
pub fn explorable<'a, I>(actor: &UserProfile, all: I) -> Vec<&'a UserProfile>
where
    I: IntoIterator<Item = &'a UserProfile>,
{
    all.into_iter()
        .filter(|candidate| candidate.id != actor.id && !actor.is_connected_to(&candidate.id))
        .collect()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldOp;
    use crate::types::Timestamp;

    fn id(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn profile(s: &str) -> UserProfile {
        UserProfile::new(id(s), s.to_uppercase(), Timestamp::new(0))
    }

    #[test]
    fn test_derive_status() {
        let mut actor = profile("u1");
        assert_eq!(actor.relationship_with(&id("u2")), RelationshipStatus::None);

        actor.sent_requests.insert(id("u2"));
        assert_eq!(
            actor.relationship_with(&id("u2")),
            RelationshipStatus::PendingOutgoing
        );

        actor.incoming_requests.insert(id("u3"));
        assert_eq!(
            actor.relationship_with(&id("u3")),
            RelationshipStatus::PendingIncoming
        );

        // Overlapping sets resolve to the most advanced state
        actor.friends.insert(id("u3"));
        assert_eq!(actor.relationship_with(&id("u3")), RelationshipStatus::Friends);
    }

    #[test]
    fn test_transition_table() {
        use RelationshipAction::*;
        use RelationshipStatus::*;

        assert_eq!(None.transition(SendRequest), Some(PendingOutgoing));
        assert_eq!(PendingIncoming.transition(Accept), Some(Friends));
        assert_eq!(PendingIncoming.transition(Reject), Some(None));

        assert_eq!(Friends.transition(SendRequest), Option::None);
        assert_eq!(PendingOutgoing.transition(SendRequest), Option::None);
        assert_eq!(PendingIncoming.transition(SendRequest), Option::None);
        assert_eq!(None.transition(Accept), Option::None);
        assert_eq!(PendingOutgoing.transition(Accept), Option::None);
        assert_eq!(None.transition(Reject), Option::None);
    }

    #[test]
    fn test_plan_send_request() {
        let actor = profile("u1");
        let (batch, next) = RelationshipAction::SendRequest
            .plan(&actor, &id("u2"))
            .unwrap();
        assert_eq!(next, RelationshipStatus::PendingOutgoing);
        assert_eq!(batch.documents().count(), 2);

        let writes = batch.writes_for(&id("u2"));
        assert_eq!(
            writes,
            vec![&FieldOp::ArrayUnion {
                field: RelationshipField::IncomingRequests,
                value: id("u1"),
            }]
        );
    }

    #[test]
    fn test_plan_rejects_invalid_preconditions() {
        let mut actor = profile("u1");

        let err = RelationshipAction::Accept.plan(&actor, &id("u2")).unwrap_err();
        assert_eq!(
            err,
            RelationshipError::InvalidTransition {
                counterpart: "u2".into(),
                status: RelationshipStatus::None,
                action: RelationshipAction::Accept,
            }
        );

        actor.friends.insert(id("u2"));
        assert!(RelationshipAction::SendRequest.plan(&actor, &id("u2")).is_err());

        let err = RelationshipAction::SendRequest
            .plan(&actor, &id("u1"))
            .unwrap_err();
        assert!(matches!(err, RelationshipError::SelfRelationship { .. }));
    }

    #[test]
    fn test_plan_accept_clears_both_directions() {
        let mut actor = profile("u1");
        actor.incoming_requests.insert(id("u2"));

        let (batch, next) = RelationshipAction::Accept.plan(&actor, &id("u2")).unwrap();
        assert_eq!(next, RelationshipStatus::Friends);

        let mut requester = profile("u2");
        requester.sent_requests.insert(id("u1"));
        batch.apply_to(&mut actor);
        batch.apply_to(&mut requester);

        assert!(actor.friends.contains(&id("u2")));
        assert!(requester.friends.contains(&id("u1")));
        assert!(actor.incoming_requests.is_empty());
        assert!(actor.sent_requests.is_empty());
        assert!(requester.sent_requests.is_empty());
        assert!(requester.incoming_requests.is_empty());
    }

    #[test]
    fn test_explorable_excludes_connections() {
        let mut actor = profile("u1");
        actor.friends.insert(id("u2"));
        actor.incoming_requests.insert(id("u3"));
        actor.sent_requests.insert(id("u4"));

        let everyone: Vec<UserProfile> = ["u1", "u2", "u3", "u4", "u5", "u6"]
            .iter()
            .map(|s| profile(s))
            .collect();

        let ids: Vec<&str> = explorable(&actor, &everyone)
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["u5", "u6"]);
    }
}
