//! Profile reading and editing for the signed-in user

use chatlink_core::{ensure_image, ChatlinkError, ProfileUpdate, Result, UserId, UserProfile};
use tracing::info;

use crate::session::Session;

/// Profile operations for one session
#[derive(Debug, Clone)]
pub struct ProfileManager {
    session: Session,
}

impl ProfileManager {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The signed-in user's profile
    pub async fn load_profile(&self) -> Result<UserProfile> {
        self.load_profile_of(self.session.user_id()).await
    }

    /// Another user's profile
    pub async fn load_profile_of(&self, id: &UserId) -> Result<UserProfile> {
        self.session
            .store()
            .get_profile(id)
            .await?
            .ok_or_else(|| ChatlinkError::not_found(id.as_str()))
    }

    /// Apply an update to the owner-writable fields
    ///
    /// A name change is mirrored to the account's display name.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        update.validate()?;
        if update.is_empty() {
            return self.load_profile().await;
        }

        let id = self.session.user_id();
        let profile = self.session.store().update_profile(id, update).await?;
        if let Some(name) = &update.name {
            self.session
                .context()
                .auth
                .update_display_name(id, name)
                .await?;
        }
        info!(user = %id, "profile updated");
        Ok(profile)
    }

    /// Upload a new avatar image and point the profile at it
    pub async fn upload_avatar(&self, bytes: Vec<u8>, content_type: &str) -> Result<UserProfile> {
        ensure_image(content_type)?;
        let url = self
            .session
            .context()
            .media
            .upload_image(bytes, content_type)
            .await?;
        let profile = self
            .session
            .store()
            .set_avatar(self.session.user_id(), &url)
            .await?;
        info!(user = %self.session.user_id(), url = %url, "avatar updated");
        Ok(profile)
    }
}
