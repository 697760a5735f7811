//! Relationship synchronizer
//!
//! Keeps the signed-in user's view of their own profile document and turns
//! friend actions into atomic two-document batches. The local view changes
//! only after the store has confirmed a commit; a failed commit leaves it as
//! it was.

use chatlink_core::{
    explorable, ChatlinkError, ProfileQuery, RelationshipAction, RelationshipStatus, Result,
    UserId, UserProfile,
};
use tracing::{debug, info, warn};

use crate::session::Session;

// ----------------------------------------------------------------------------
// Synchronizer
// ----------------------------------------------------------------------------

/// Friend-request and friendship operations for one session
#[derive(Debug)]
pub struct RelationshipSynchronizer {
    session: Session,
    view: Option<UserProfile>,
}

impl RelationshipSynchronizer {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            view: None,
        }
    }

    /// The last read of the user's own profile, if any
    pub fn view(&self) -> Option<&UserProfile> {
        self.view.as_ref()
    }

    /// Re-read the user's profile document from the store
    pub async fn refresh(&mut self) -> Result<&UserProfile> {
        let id = self.session.user_id();
        let profile = self
            .session
            .store()
            .get_profile(id)
            .await?
            .ok_or_else(|| ChatlinkError::not_found(id.as_str()))?;
        debug!(user = %id, friends = profile.friends.len(), "relationship view refreshed");
        Ok(self.view.insert(profile))
    }

    async fn current(&mut self) -> Result<&UserProfile> {
        if self.view.is_none() {
            self.refresh().await?;
        }
        self.view
            .as_ref()
            .ok_or_else(|| ChatlinkError::not_found(self.session.user_id().as_str()))
    }

    /// Relationship towards `counterpart` according to the current view
    pub async fn status_of(&mut self, counterpart: &UserId) -> Result<RelationshipStatus> {
        Ok(self.current().await?.relationship_with(counterpart))
    }

    /// Ask `target` to connect
    pub async fn send_request(&mut self, target: &UserId) -> Result<RelationshipStatus> {
        self.perform(RelationshipAction::SendRequest, target).await
    }

    /// Accept a pending request from `requester`
    pub async fn accept(&mut self, requester: &UserId) -> Result<RelationshipStatus> {
        self.perform(RelationshipAction::Accept, requester).await
    }

    /// Decline a pending request from `requester`
    pub async fn reject(&mut self, requester: &UserId) -> Result<RelationshipStatus> {
        self.perform(RelationshipAction::Reject, requester).await
    }

    async fn perform(
        &mut self,
        action: RelationshipAction,
        counterpart: &UserId,
    ) -> Result<RelationshipStatus> {
        let planned = action.plan(self.current().await?, counterpart);
        let (batch, next) = match planned {
            Ok(planned) => planned,
            Err(err) => {
                warn!(
                    user = %self.session.user_id(),
                    counterpart = %counterpart,
                    %action,
                    "relationship action refused: {}",
                    err
                );
                return Err(err.into());
            }
        };

        if let Err(err) = self.session.store().commit(batch.clone()).await {
            warn!(
                user = %self.session.user_id(),
                counterpart = %counterpart,
                %action,
                "relationship commit failed: {}",
                err
            );
            return Err(err);
        }

        if let Some(view) = self.view.as_mut() {
            batch.apply_to(view);
            view.updated_at = self.session.context().now();
        }
        info!(
            user = %self.session.user_id(),
            counterpart = %counterpart,
            %action,
            status = %next,
            "relationship updated"
        );
        Ok(next)
    }

    /// Users with no relationship to the signed-in user
    pub async fn list_explorable(&mut self) -> Result<Vec<UserProfile>> {
        let others = self
            .session
            .store()
            .query_profiles(&ProfileQuery::Excluding(self.session.user_id().clone()))
            .await?;
        let me = self.current().await?;
        Ok(explorable(me, &others).into_iter().cloned().collect())
    }

    /// Profiles of the user's friends
    pub async fn list_friends(&mut self) -> Result<Vec<UserProfile>> {
        let ids: Vec<UserId> = self.current().await?.friends.iter().cloned().collect();
        self.resolve(ids).await
    }

    /// Profiles of users waiting for the user to answer their request
    pub async fn list_incoming(&mut self) -> Result<Vec<UserProfile>> {
        let ids: Vec<UserId> = self
            .current()
            .await?
            .incoming_requests
            .iter()
            .cloned()
            .collect();
        self.resolve(ids).await
    }

    /// Profiles of users the user has asked to connect
    pub async fn list_sent(&mut self) -> Result<Vec<UserProfile>> {
        let ids: Vec<UserId> = self.current().await?.sent_requests.iter().cloned().collect();
        self.resolve(ids).await
    }

    /// Resolve ids to profiles with membership queries of bounded size
    async fn resolve(&self, ids: Vec<UserId>) -> Result<Vec<UserProfile>> {
        let limit = self.session.config().store.membership_query_limit.max(1);
        let mut profiles = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(limit) {
            let found = self
                .session
                .store()
                .query_profiles(&ProfileQuery::Members(chunk.to_vec()))
                .await?;
            profiles.extend(found);
        }
        if profiles.len() < ids.len() {
            debug!(
                requested = ids.len(),
                found = profiles.len(),
                "some related profiles are missing"
            );
        }
        Ok(profiles)
    }
}

// ----------------------------------------------------------------------------
// Search
// ----------------------------------------------------------------------------

/// Case-insensitive display-name filter over any profile list
pub fn search(profiles: Vec<UserProfile>, query: &str) -> Vec<UserProfile> {
    profiles
        .into_iter()
        .filter(|profile| profile.matches_search(query))
        .collect()
}
