//! Command handlers for the chatlink CLI

use std::path::Path;
use std::sync::Arc;

use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use chatlink_core::{AuthConfig, MemoryAuthProvider, UserId};
use chatlink_runtime::{
    search, ChatClient, ChatlinkError, Message, ProfileUpdate, Session, SignUpForm, UserProfile,
};

use crate::app::ChatlinkApp;
use crate::cli::{Cli, Commands, ListArgs, ProfileCommand, ProfileEditArgs};
use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command, then persist state whether or not it succeeded
    pub async fn execute(cli: Cli, mut app: ChatlinkApp) -> Result<()> {
        let outcome = Self::dispatch(cli.command, &mut app).await;
        if let Err(e) = app.save().await {
            warn!("Failed to save state: {}", e);
            outcome?;
            return Err(e);
        }
        outcome
    }

    async fn dispatch(command: Commands, app: &mut ChatlinkApp) -> Result<()> {
        match command {
            Commands::Signup {
                name,
                email,
                password,
                confirm,
            } => {
                let form = SignUpForm {
                    name,
                    email,
                    password,
                    confirm_password: confirm,
                };
                Self::handle_signup_command(app, form).await
            }
            Commands::Verify { confirm } => Self::handle_verify_command(app, confirm).await,
            Commands::Resend => Self::handle_resend_command(app).await,
            Commands::Login { email, password } => {
                Self::handle_login_command(app, &email, &password).await
            }
            Commands::Logout => Self::handle_logout_command(app).await,
            Commands::Whoami => Self::handle_whoami_command(app).await,
            Commands::Profile { action } => match action {
                ProfileCommand::Show { user } => {
                    Self::handle_profile_show_command(app, user.as_deref()).await
                }
                ProfileCommand::Edit(args) => Self::handle_profile_edit_command(app, args).await,
            },
            Commands::Avatar { file, content_type } => {
                Self::handle_avatar_command(app, &file, content_type).await
            }
            Commands::Explore(list) => Self::handle_explore_command(app, list).await,
            Commands::Friends(list) => Self::handle_friends_command(app, list).await,
            Commands::Requests { sent, list } => {
                Self::handle_requests_command(app, sent, list).await
            }
            Commands::Request { user } => Self::handle_request_command(app, &user).await,
            Commands::Accept { user } => Self::handle_accept_command(app, &user).await,
            Commands::Reject { user } => Self::handle_reject_command(app, &user).await,
            Commands::Send { to, message } => Self::handle_send_command(app, &to, &message).await,
            Commands::History { user } => Self::handle_history_command(app, &user).await,
            Commands::Demo => Self::handle_demo_command().await,
            Commands::ExampleConfig => {
                println!("{}", AppConfig::example_config());
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------------

    async fn handle_signup_command(app: &mut ChatlinkApp, form: SignUpForm) -> Result<()> {
        let pending = app.client().auth().sign_up(&form).await?;
        let window = app.config().core.verification.window_secs;

        println!("Account created for {} ({})", pending.user.email, pending.user.id);
        println!(
            "A verification email has been sent. Run `chatlink verify` within {} seconds.",
            window
        );

        let state = app.state_mut();
        state.current_user = None;
        state.pending = Some(pending);
        Ok(())
    }

    async fn handle_verify_command(app: &mut ChatlinkApp, confirm: bool) -> Result<()> {
        let pending = app
            .state()
            .pending
            .clone()
            .ok_or(CliError::NoPendingVerification)?;

        if confirm {
            app.auth_backend().confirm_email(&pending.user.id).await?;
            info!(user = %pending.user.id, "confirmed email on the local backend");
        }

        let session = match app.client().auth().check_verification(&pending).await {
            Ok(session) => session,
            Err(e) => {
                let window = app.config().core.verification.window_secs;
                if pending.is_expired(app.client().context().now(), window) {
                    app.state_mut().pending = None;
                }
                return Err(e.into());
            }
        };

        println!("Email verified. Signed in as {}", session.user_id());
        let state = app.state_mut();
        state.pending = None;
        state.current_user = Some(session.user_id().clone());
        Ok(())
    }

    async fn handle_resend_command(app: &mut ChatlinkApp) -> Result<()> {
        let pending = app
            .state()
            .pending
            .clone()
            .ok_or(CliError::NoPendingVerification)?;
        app.client().auth().resend_verification(&pending).await?;

        let remaining = pending.remaining_secs(
            app.client().context().now(),
            app.config().core.verification.window_secs,
        );
        println!("Verification email sent again to {}", pending.user.email);
        println!("{} seconds left to verify", remaining);
        Ok(())
    }

    async fn handle_login_command(app: &mut ChatlinkApp, email: &str, password: &str) -> Result<()> {
        let session = app.client().auth().sign_in(email, password).await?;
        println!("Signed in as {} ({})", session.user().email, session.user_id());

        let state = app.state_mut();
        state.current_user = Some(session.user_id().clone());
        state.pending = None;
        Ok(())
    }

    async fn handle_logout_command(app: &mut ChatlinkApp) -> Result<()> {
        let session = app.session().await?;
        app.client().auth().sign_out(session).await?;
        app.state_mut().current_user = None;
        println!("Signed out");
        Ok(())
    }

    async fn handle_whoami_command(app: &mut ChatlinkApp) -> Result<()> {
        let session = app.session().await?;
        let user = session.user();
        println!("Id:    {}", user.id);
        println!("Email: {}", user.email);
        if let Some(name) = &user.display_name {
            println!("Name:  {}", name);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------------

    async fn handle_profile_show_command(app: &mut ChatlinkApp, user: Option<&str>) -> Result<()> {
        let session = app.session().await?;
        let profiles = app.client().profiles(&session);

        match user {
            Some(id) => {
                let id = UserId::new(id)?;
                let profile = profiles.load_profile_of(&id).await?;
                let status = app.client().relationships(&session).status_of(&id).await?;
                print_profile(&profile);
                println!("Relationship: {}", status);
            }
            None => print_profile(&profiles.load_profile().await?),
        }
        Ok(())
    }

    async fn handle_profile_edit_command(app: &mut ChatlinkApp, args: ProfileEditArgs) -> Result<()> {
        let update = ProfileUpdate {
            name: args.name,
            bio: args.bio,
            location: args.location,
            country: args.country,
            email: args.email,
            phone: args.phone,
            birth_date: args.birth_date,
        };
        if update.is_empty() {
            return Err(CliError::InvalidArgument(
                "nothing to update; pass at least one field".to_string(),
            ));
        }

        let session = app.session().await?;
        let profile = app.client().profiles(&session).update_profile(&update).await?;
        println!("Profile updated");
        print_profile(&profile);
        Ok(())
    }

    async fn handle_avatar_command(
        app: &mut ChatlinkApp,
        file: &Path,
        content_type: Option<String>,
    ) -> Result<()> {
        let bytes = std::fs::read(file)?;
        let content_type = content_type.unwrap_or_else(|| guess_content_type(file).to_string());

        let session = app.session().await?;
        let profile = app
            .client()
            .profiles(&session)
            .upload_avatar(bytes, &content_type)
            .await?;
        println!(
            "Avatar updated: {}",
            profile.avatar.as_deref().unwrap_or_default()
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------------

    async fn handle_explore_command(app: &mut ChatlinkApp, list: ListArgs) -> Result<()> {
        let session = app.session().await?;
        let users = app.client().relationships(&session).list_explorable().await?;
        print_profiles("People you may know", filter(users, &list));
        Ok(())
    }

    async fn handle_friends_command(app: &mut ChatlinkApp, list: ListArgs) -> Result<()> {
        let session = app.session().await?;
        let friends = app.client().relationships(&session).list_friends().await?;
        print_profiles("Friends", filter(friends, &list));
        Ok(())
    }

    async fn handle_requests_command(app: &mut ChatlinkApp, sent: bool, list: ListArgs) -> Result<()> {
        let session = app.session().await?;
        let mut relationships = app.client().relationships(&session);
        if sent {
            let users = relationships.list_sent().await?;
            print_profiles("Sent requests", filter(users, &list));
        } else {
            let users = relationships.list_incoming().await?;
            print_profiles("Friend requests", filter(users, &list));
        }
        Ok(())
    }

    async fn handle_request_command(app: &mut ChatlinkApp, user: &str) -> Result<()> {
        let target = UserId::new(user)?;
        let session = app.session().await?;
        let status = app
            .client()
            .relationships(&session)
            .send_request(&target)
            .await?;
        println!("Friend request sent to {} ({})", target, status);
        Ok(())
    }

    async fn handle_accept_command(app: &mut ChatlinkApp, user: &str) -> Result<()> {
        let requester = UserId::new(user)?;
        let session = app.session().await?;
        app.client().relationships(&session).accept(&requester).await?;
        println!("You and {} are now friends", requester);
        Ok(())
    }

    async fn handle_reject_command(app: &mut ChatlinkApp, user: &str) -> Result<()> {
        let requester = UserId::new(user)?;
        let session = app.session().await?;
        app.client().relationships(&session).reject(&requester).await?;
        println!("Request from {} rejected", requester);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Messaging
    // ------------------------------------------------------------------------

    async fn handle_send_command(app: &mut ChatlinkApp, to: &str, text: &str) -> Result<()> {
        let receiver = UserId::new(to)?;
        let session = app.session().await?;
        let message = app.client().chat(&session).send_message(&receiver, text).await?;
        println!("Sent to {} in {}", receiver, message.conversation());
        Ok(())
    }

    async fn handle_history_command(app: &mut ChatlinkApp, user: &str) -> Result<()> {
        let counterpart = UserId::new(user)?;
        let session = app.session().await?;
        let history = app.client().chat(&session).history(&counterpart).await?;

        if history.is_empty() {
            println!("No messages with {} yet", counterpart);
            return Ok(());
        }
        let shown = app.config().cli.max_printed_messages;
        let skip = history.len().saturating_sub(shown);
        for message in &history[skip..] {
            print_message(&session, message);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Demo
    // ------------------------------------------------------------------------

    /// Scripted walkthrough on a throwaway backend; local state is untouched
    async fn handle_demo_command() -> Result<()> {
        let auth = Arc::new(MemoryAuthProvider::new(AuthConfig::default()));
        let client = ChatClient::builder().with_auth(auth.clone()).build()?;

        let alice = demo_account(&client, &auth, "Alice").await?;
        let bob = demo_account(&client, &auth, "Bob").await?;
        println!("Created and verified Alice ({}) and Bob ({})", alice.user_id(), bob.user_id());

        let mut alice_links = client.relationships(&alice);
        let explorable = alice_links.list_explorable().await?;
        print_profiles("Alice can explore", explorable);

        let status = alice_links.send_request(bob.user_id()).await?;
        println!("Alice -> Bob: {}", status);

        let mut bob_links = client.relationships(&bob);
        print_profiles("Bob's requests", bob_links.list_incoming().await?);
        let status = bob_links.accept(alice.user_id()).await?;
        println!("Bob accepted Alice: {}", status);

        let bob_chat = client.chat(&bob);
        let mut inbox = bob_chat.subscribe(alice.user_id()).await?;
        let alice_chat = client.chat(&alice);
        alice_chat.send_message(bob.user_id(), "Hi Bob!").await?;

        match timeout(Duration::from_secs(1), inbox.next_message()).await {
            Ok(Some(message)) => println!("Bob received: {}", message.text),
            _ => warn!("Bob's subscription delivered nothing"),
        }
        inbox.unsubscribe();

        bob_chat.send_message(alice.user_id(), "Hey Alice, welcome!").await?;
        println!("Conversation {}:", alice_chat.conversation_with(bob.user_id()));
        for message in alice_chat.history(bob.user_id()).await? {
            print_message(&alice, &message);
        }
        Ok(())
    }
}

async fn demo_account(
    client: &ChatClient,
    auth: &MemoryAuthProvider,
    name: &str,
) -> std::result::Result<Session, ChatlinkError> {
    let password = "demo-password".to_string();
    let form = SignUpForm {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: password.clone(),
        confirm_password: password,
    };
    let pending = client.auth().sign_up(&form).await?;
    auth.confirm_email(&pending.user.id).await?;
    client.auth().check_verification(&pending).await
}

// ----------------------------------------------------------------------------
// Output helpers
// ----------------------------------------------------------------------------

fn filter(profiles: Vec<UserProfile>, list: &ListArgs) -> Vec<UserProfile> {
    match &list.search {
        Some(query) => search(profiles, query),
        None => profiles,
    }
}

fn print_profiles(title: &str, profiles: Vec<UserProfile>) {
    println!("{} ({}):", title, profiles.len());
    for profile in profiles {
        match &profile.email {
            Some(email) => println!("  {}  {} <{}>", profile.id, profile.name, email),
            None => println!("  {}  {}", profile.id, profile.name),
        }
    }
}

fn print_profile(profile: &UserProfile) {
    println!("{} ({})", profile.name, profile.id);
    let fields = [
        ("Email", &profile.email),
        ("Bio", &profile.bio),
        ("Location", &profile.location),
        ("Country", &profile.country),
        ("Phone", &profile.phone),
        ("Birth date", &profile.birth_date),
        ("Avatar", &profile.avatar),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
    println!(
        "  Friends: {}  Requests: {}  Sent: {}",
        profile.friends.len(),
        profile.incoming_requests.len(),
        profile.sent_requests.len()
    );
}

fn print_message(session: &Session, message: &Message) {
    let who = if message.is_from(session.user_id()) {
        "you".to_string()
    } else {
        message.sender.to_string()
    };
    println!("[{}] {}: {}", message.created_at, who, message.text);
}

fn guess_content_type(file: &Path) -> &'static str {
    let extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
