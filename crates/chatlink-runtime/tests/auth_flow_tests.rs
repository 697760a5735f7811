//! Integration tests for sign-up, email verification and sign-in


use chatlink_core::DocumentStore;
use chatlink_runtime::{Notice, NoticeLevel, SignUpForm};
use test_utils::TestHarness;
use tokio_test::assert_err;

#[tokio::test]
async fn test_sign_up_form_checks() {
    let harness = TestHarness::new();
    let auth = harness.client.auth();

    let mut form = TestHarness::form("Zara");
    form.confirm_password = String::new();
    let err = assert_err!(auth.sign_up(&form).await);
    assert_eq!(err.to_string(), "Please fill all fields");

    let mut form = TestHarness::form("Zara");
    form.confirm_password = "different".into();
    let err = assert_err!(auth.sign_up(&form).await);
    assert_eq!(err.to_string(), "Passwords do not match");

    let form = SignUpForm {
        password: "123".into(),
        confirm_password: "123".into(),
        ..TestHarness::form("Zara")
    };
    let err = assert_err!(auth.sign_up(&form).await);
    assert_eq!(err.to_string(), "Password should be at least 6 characters");

    let pending = auth.sign_up(&TestHarness::form("Zara")).await.unwrap();
    assert_eq!(pending.user.display_name.as_deref(), Some("Zara"));
    assert_eq!(harness.auth.verification_emails_sent(&pending.user.id).await, 1);

    // Same email again
    assert!(auth.sign_up(&TestHarness::form("Zara")).await.is_err());
}

#[tokio::test]
async fn test_verification_creates_profile_once() {
    let harness = TestHarness::new();
    let auth = harness.client.auth();
    let pending = harness.pending_user("Kamran").await;

    let err = assert_err!(auth.check_verification(&pending).await);
    assert_eq!(err.to_string(), "Please verify your email first.");
    assert_eq!(harness.store.profile_count().await, 0);

    auth.resend_verification(&pending).await.unwrap();
    assert_eq!(harness.auth.verification_emails_sent(&pending.user.id).await, 2);

    harness.auth.confirm_email(&pending.user.id).await.unwrap();
    let session = auth.check_verification(&pending).await.unwrap();
    assert_eq!(session.user_id(), &pending.user.id);

    let profile = harness
        .store
        .get_profile(&pending.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.name, "Kamran");
    assert_eq!(profile.email.as_deref(), Some("kamran@example.com"));

    // Checking again reuses the existing document
    auth.check_verification(&pending).await.unwrap();
    assert_eq!(harness.store.profile_count().await, 1);
}

#[tokio::test]
async fn test_verification_window_expires() {
    let harness = TestHarness::new();
    let auth = harness.client.auth();
    let pending = harness.pending_user("Sana").await;
    harness.auth.confirm_email(&pending.user.id).await.unwrap();

    harness.clock.advance_secs(301);
    let err = assert_err!(auth.check_verification(&pending).await);
    assert_eq!(err.to_string(), "Verification time expired. Please try again.");

    let notice = Notice::from_error(&err);
    assert_eq!(notice.level, NoticeLevel::Error);

    // Resending does not restart the window
    auth.resend_verification(&pending).await.unwrap();
    assert!(auth.check_verification(&pending).await.is_err());
}

#[tokio::test]
async fn test_sign_in_requires_verified_account() {
    let harness = TestHarness::new();
    let auth = harness.client.auth();

    let err = assert_err!(auth.sign_in("", "secret-pass").await);
    assert_eq!(err.to_string(), "Please enter email and password");

    let pending = harness.pending_user("Nadia").await;
    let err = assert_err!(auth.sign_in("nadia@example.com", "secret-pass").await);
    assert_eq!(err.to_string(), "Please verify your email first.");
    assert!(!harness.auth.is_signed_in(&pending.user.id).await);

    harness.auth.confirm_email(&pending.user.id).await.unwrap();
    assert!(auth.sign_in("nadia@example.com", "wrong-pass").await.is_err());

    // Verified but never checked: sign-in creates the profile
    let session = auth.sign_in("nadia@example.com", "secret-pass").await.unwrap();
    assert!(harness.store.get_profile(session.user_id()).await.unwrap().is_some());
    assert!(harness.auth.is_signed_in(session.user_id()).await);

    let id = session.user_id().clone();
    auth.sign_out(session).await.unwrap();
    assert!(!harness.auth.is_signed_in(&id).await);
}

#[tokio::test]
async fn test_resume_remembered_user() {
    let harness = TestHarness::new();
    let auth = harness.client.auth();

    let pending = harness.pending_user("Omer").await;
    assert!(auth.resume(&pending.user.id).await.is_err());
    assert_eq!(harness.store.profile_count().await, 0);

    harness.auth.confirm_email(&pending.user.id).await.unwrap();
    let session = auth.resume(&pending.user.id).await.unwrap();
    assert_eq!(session.user().display_name.as_deref(), Some("Omer"));
    assert!(harness.store.get_profile(session.user_id()).await.unwrap().is_some());
}
