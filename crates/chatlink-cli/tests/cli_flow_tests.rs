//! End-to-end command runs against a scratch state directory

use std::path::PathBuf;

use clap::Parser;

use chatlink_cli::{
    commands::CommandDispatcher, config::AppConfig, state::AppState, ChatlinkApp, Cli, CliError,
};
use chatlink_core::{conversation_key, UserId};
use tokio_test::assert_err;

struct Workspace {
    config: AppConfig,
}

impl Workspace {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "chatlink-cli-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);

        let mut config = AppConfig::default();
        config.state.state_dir = Some(dir);
        Self { config }
    }

    async fn run(&self, args: &[&str]) -> Result<(), CliError> {
        let mut argv = vec!["chatlink"];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);
        let app = ChatlinkApp::new(self.config.clone())?;
        CommandDispatcher::execute(cli, app).await
    }

    fn state(&self) -> AppState {
        AppState::load_from_file(&self.config.state_path()).unwrap()
    }

    fn state_dir(&self) -> PathBuf {
        self.config.state_dir()
    }

    /// Sign up and verify; returns the new user's id
    async fn register(&self, name: &str) -> UserId {
        let email = format!("{}@example.com", name.to_lowercase());
        self.run(&[
            "signup", "--name", name, "--email", email.as_str(), "--password", "secret-pass", "--confirm",
            "secret-pass",
        ])
        .await
        .unwrap();
        let id = self.state().pending.unwrap().user.id;

        self.run(&["verify", "--confirm"]).await.unwrap();
        assert_eq!(self.state().current_user, Some(id.clone()));
        id
    }

    async fn login(&self, name: &str) {
        let email = format!("{}@example.com", name.to_lowercase());
        self.run(&["login", "--email", email.as_str(), "--password", "secret-pass"])
            .await
            .unwrap();
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(self.state_dir());
    }
}

#[tokio::test]
async fn test_unverified_signup_cannot_sign_in() {
    let ws = Workspace::new("unverified");
    ws.run(&[
        "signup", "--name", "Rafay", "--email", "rafay@example.com", "--password", "secret-pass",
        "--confirm", "secret-pass",
    ])
    .await
    .unwrap();

    let err = assert_err!(ws.run(&["verify"]).await);
    assert!(err.to_string().contains("verify your email"));
    assert!(ws.state().pending.is_some());

    let err = ws
        .run(&["login", "--email", "rafay@example.com", "--password", "secret-pass"])
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Chatlink(_)));
    assert!(matches!(ws.run(&["whoami"]).await, Err(CliError::NotSignedIn)));
}

#[tokio::test]
async fn test_friendship_and_messages_persist_between_runs() {
    let ws = Workspace::new("friends");
    let saad = ws.register("Saad").await;
    let tania = ws.register("Tania").await;

    // Tania is signed in after her verification
    ws.run(&["request", saad.as_str()]).await.unwrap();
    let state = ws.state();
    assert!(state.store.profiles[&tania].sent_requests.contains(&saad));
    assert!(state.store.profiles[&saad].incoming_requests.contains(&tania));

    ws.login("Saad").await;
    ws.run(&["requests"]).await.unwrap();
    ws.run(&["accept", tania.as_str()]).await.unwrap();
    ws.run(&["send", "--to", tania.as_str(), "Salam!"]).await.unwrap();
    ws.run(&["history", tania.as_str()]).await.unwrap();

    let state = ws.state();
    assert!(state.store.profiles[&saad].friends.contains(&tania));
    assert!(state.store.profiles[&tania].friends.contains(&saad));
    assert!(state.store.profiles[&saad].incoming_requests.is_empty());
    assert!(state.store.profiles[&tania].sent_requests.is_empty());

    let messages = &state.store.conversations[&conversation_key(&saad, &tania)];
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Salam!");

    // Accepting twice is a precondition failure
    assert!(ws.run(&["accept", tania.as_str()]).await.is_err());

    ws.run(&["logout"]).await.unwrap();
    assert!(ws.state().current_user.is_none());
}

#[tokio::test]
async fn test_profile_edit_requires_a_field() {
    let ws = Workspace::new("profile");
    let id = ws.register("Umama").await;

    let err = assert_err!(ws.run(&["profile", "edit"]).await);
    assert!(matches!(err, CliError::InvalidArgument(_)));

    ws.run(&["profile", "edit", "--bio", "Hello", "--country", "Pakistan"])
        .await
        .unwrap();
    let profile = &ws.state().store.profiles[&id];
    assert_eq!(profile.bio.as_deref(), Some("Hello"));
    assert_eq!(profile.country.as_deref(), Some("Pakistan"));
}
