//! Property-based tests for conversation keys and the relationship planner
//!
//! Random sequences of relationship actions are planned against a small
//! population and applied batch by batch; the cross-document invariants must
//! hold after every step.

use std::collections::BTreeMap;

use chatlink_core::{
    conversation_key, explorable, ConversationKey, RelationshipAction, RelationshipStatus,
    Timestamp, UserId, UserProfile,
};
use proptest::prelude::*;

const POPULATION: usize = 5;

/// Generate arbitrary valid UserId
fn arb_user_id() -> impl Strategy<Value = UserId> {
    prop::string::string_regex(r"[A-Za-z0-9-]{1,24}")
        .unwrap()
        .prop_map(|s| UserId::new(s).unwrap())
}

/// Generate one (actor, counterpart, action) step over the fixed population
fn arb_step() -> impl Strategy<Value = (usize, usize, RelationshipAction)> {
    (
        0..POPULATION,
        0..POPULATION,
        prop_oneof![
            Just(RelationshipAction::SendRequest),
            Just(RelationshipAction::Accept),
            Just(RelationshipAction::Reject),
        ],
    )
}

fn population() -> BTreeMap<UserId, UserProfile> {
    (0..POPULATION)
        .map(|n| {
            let id = UserId::new(format!("u{}", n)).unwrap();
            (id.clone(), UserProfile::new(id, format!("User {}", n), Timestamp::new(0)))
        })
        .collect()
}

fn user(n: usize) -> UserId {
    UserId::new(format!("u{}", n)).unwrap()
}

/// Check symmetry, inverse and exclusion across every pair
fn check_invariants(profiles: &BTreeMap<UserId, UserProfile>) -> Result<(), TestCaseError> {
    for (a_id, a) in profiles {
        for (b_id, b) in profiles {
            prop_assert_eq!(a.friends.contains(b_id), b.friends.contains(a_id));
            prop_assert_eq!(
                a.incoming_requests.contains(b_id),
                b.sent_requests.contains(a_id)
            );
            let pending = a.incoming_requests.contains(b_id) || a.sent_requests.contains(b_id);
            prop_assert!(!(pending && a.friends.contains(b_id)));
            prop_assert!(
                !(a.incoming_requests.contains(b_id) && a.sent_requests.contains(b_id))
            );
        }
        prop_assert!(!a.is_connected_to(a_id));
    }
    Ok(())
}

proptest! {
    /// Property: both participants derive the same key
    #[test]
    fn conversation_key_is_commutative(a in arb_user_id(), b in arb_user_id()) {
        prop_assert_eq!(conversation_key(&a, &b), conversation_key(&b, &a));
    }

    /// Property: a derived key parses back into its ordered participants
    #[test]
    fn conversation_key_parses_back(a in arb_user_id(), b in arb_user_id()) {
        let key = conversation_key(&a, &b);
        let parsed = ConversationKey::parse(key.as_str()).unwrap();
        let (lo, hi) = parsed.participants();
        prop_assert!(lo <= hi);
        prop_assert!(parsed.includes(&a));
        prop_assert!(parsed.includes(&b));
        prop_assert_eq!(parsed, key);
    }

    /// Property: relationship invariants survive any action sequence
    #[test]
    fn relationship_invariants_hold(steps in prop::collection::vec(arb_step(), 1..60)) {
        let mut profiles = population();

        for (actor_n, counterpart_n, action) in steps {
            let actor = profiles[&user(actor_n)].clone();
            let counterpart = user(counterpart_n);
            let before = actor.relationship_with(&counterpart);

            match action.plan(&actor, &counterpart) {
                Ok((batch, next)) => {
                    prop_assert_eq!(before.transition(action), Some(next));
                    for profile in profiles.values_mut() {
                        batch.apply_to(profile);
                    }
                    prop_assert_eq!(profiles[&user(actor_n)].relationship_with(&counterpart), next);
                }
                Err(_) => {
                    prop_assert!(actor_n == counterpart_n || before.transition(action).is_none());
                }
            }

            check_invariants(&profiles)?;
        }
    }

    /// Property: accepting makes both sides friends with no pending markers left
    #[test]
    fn accept_installs_friendship(a in 0..POPULATION, b in 0..POPULATION) {
        prop_assume!(a != b);
        let mut profiles = population();

        let sender = profiles[&user(a)].clone();
        let (batch, _) = RelationshipAction::SendRequest.plan(&sender, &user(b)).unwrap();
        for profile in profiles.values_mut() {
            batch.apply_to(profile);
        }

        let receiver = profiles[&user(b)].clone();
        prop_assert_eq!(receiver.relationship_with(&user(a)), RelationshipStatus::PendingIncoming);
        let (batch, _) = RelationshipAction::Accept.plan(&receiver, &user(a)).unwrap();
        for profile in profiles.values_mut() {
            batch.apply_to(profile);
        }

        let (pa, pb) = (&profiles[&user(a)], &profiles[&user(b)]);
        prop_assert!(pa.friends.contains(&user(b)) && pb.friends.contains(&user(a)));
        prop_assert!(pa.sent_requests.is_empty() && pb.incoming_requests.is_empty());
    }

    /// Property: explorable excludes the actor and every connected user
    #[test]
    fn explorable_excludes_connections(steps in prop::collection::vec(arb_step(), 0..30)) {
        let mut profiles = population();
        for (actor_n, counterpart_n, action) in steps {
            let actor = profiles[&user(actor_n)].clone();
            if let Ok((batch, _)) = action.plan(&actor, &user(counterpart_n)) {
                for profile in profiles.values_mut() {
                    batch.apply_to(profile);
                }
            }
        }

        let me = &profiles[&user(0)];
        let listed = explorable(me, profiles.values());
        for candidate in &listed {
            prop_assert!(candidate.id != me.id);
            prop_assert!(!me.is_connected_to(&candidate.id));
        }
        let expected = profiles
            .values()
            .filter(|p| p.id != me.id && !me.is_connected_to(&p.id))
            .count();
        prop_assert_eq!(listed.len(), expected);
    }
}
