//! Account lifecycle: sign-up, email verification, sign-in and sign-out
//!
//! The profile document is created the first time a verified account reaches
//! the client, using the account's display name and email.

use chatlink_core::{AuthUser, ChatlinkError, Result, UserId, UserProfile};
use tracing::{debug, info, warn};

use crate::session::{ClientContext, PendingVerification, Session};

/// Sign-up form as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Manages authentication against the configured provider
#[derive(Debug, Clone)]
pub struct AuthManager {
    context: ClientContext,
}

impl AuthManager {
    pub fn new(context: ClientContext) -> Self {
        Self { context }
    }

    /// Create an account, send the verification email and set the display name
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<PendingVerification> {
        let fields = [&form.name, &form.email, &form.password, &form.confirm_password];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ChatlinkError::auth("Please fill all fields"));
        }
        if form.password != form.confirm_password {
            return Err(ChatlinkError::auth("Passwords do not match"));
        }

        let auth = &self.context.auth;
        let user = auth.sign_up(form.email.trim(), &form.password).await?;
        auth.send_email_verification(&user.id).await?;
        let user = auth.update_display_name(&user.id, form.name.trim()).await?;

        info!(user = %user.id, "account created, awaiting verification");
        Ok(PendingVerification {
            user,
            started_at: self.context.now(),
        })
    }

    /// Check whether the pending account has been verified
    ///
    /// On success the profile document exists and a session is returned.
    pub async fn check_verification(&self, pending: &PendingVerification) -> Result<Session> {
        let window = self.context.config.verification.window_secs;
        if pending.is_expired(self.context.now(), window) {
            warn!(user = %pending.user.id, "verification window expired");
            return Err(ChatlinkError::auth(
                "Verification time expired. Please try again.",
            ));
        }

        let user = self.context.auth.reload(&pending.user.id).await?;
        if !user.email_verified {
            debug!(user = %user.id, "email not verified yet");
            return Err(ChatlinkError::auth("Please verify your email first."));
        }

        self.open_session(user).await
    }

    /// Send the verification email again; the window keeps running
    pub async fn resend_verification(&self, pending: &PendingVerification) -> Result<()> {
        self.context
            .auth
            .send_email_verification(&pending.user.id)
            .await?;
        info!(user = %pending.user.id, "verification email resent");
        Ok(())
    }

    /// Sign in with email and password; only verified accounts get a session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ChatlinkError::auth("Please enter email and password"));
        }

        let auth = &self.context.auth;
        let user = auth.sign_in(email.trim(), password).await?;
        if !user.email_verified {
            auth.sign_out(&user.id).await?;
            return Err(ChatlinkError::auth("Please verify your email first."));
        }

        self.open_session(user).await
    }

    /// Reopen a session for an account the provider still knows
    ///
    /// Used when the client restarts with a remembered user; unverified
    /// accounts do not get a session.
    pub async fn resume(&self, user: &UserId) -> Result<Session> {
        let user = self.context.auth.reload(user).await?;
        if !user.email_verified {
            return Err(ChatlinkError::auth("Please verify your email first."));
        }
        self.open_session(user).await
    }

    /// End a session
    pub async fn sign_out(&self, session: Session) -> Result<()> {
        self.context.auth.sign_out(session.user_id()).await?;
        info!(user = %session.user_id(), "signed out");
        Ok(())
    }

    async fn open_session(&self, user: AuthUser) -> Result<Session> {
        let store = &self.context.store;
        if store.get_profile(&user.id).await?.is_none() {
            let name = user
                .display_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| user.email.clone());
            let profile =
                UserProfile::new(user.id.clone(), name, self.context.now()).with_email(&user.email);
            store.create_profile(profile).await?;
            info!(user = %user.id, "created profile document");
        }

        info!(user = %user.id, "session opened");
        Ok(Session::new(user, self.context.clone()))
    }
}
