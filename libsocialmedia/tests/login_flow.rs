//! Login flow tests driven through the public mock platform
//!
//! No network: the handshake and the smoke-test post are both mocked, and
//! only the token store touches disk.

use std::time::Duration;

use libsocialmedia::login::{LoginFlow, LoginOptions};
use libsocialmedia::platforms::mock::{MockAuthFailure, MockAuthenticator, MockPlatform};
use libsocialmedia::{
    CredentialRecord, LoginEvent, LoginInteraction, PlatformId, Result, SmokeTestOutcome,
    SocialError, TokenStore,
};
use tempfile::TempDir;

struct FixedPin(&'static str);

impl LoginInteraction for FixedPin {
    fn verifier(&mut self, _platform: PlatformId, _authorization_url: &str) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn notify(&mut self, _event: LoginEvent) {}
}

fn no_delay() -> LoginOptions {
    LoginOptions {
        smoke_test_delay: Duration::ZERO,
        smoke_test_text: "Hello to my workld!!".to_string(),
    }
}

#[tokio::test]
async fn test_login_then_smoke_test_with_mocks() {
    let temp_dir = TempDir::new().unwrap();
    let store = TokenStore::new(temp_dir.path().join("tokens.json"));
    let auth = MockAuthenticator::success("tok", "sec");
    let client = MockPlatform::success("123", "https://x.com/status/123");

    let report = LoginFlow::new(&auth, &client, &store, no_delay())
        .run(&mut FixedPin("4242"))
        .await
        .unwrap();

    assert!(report.smoke_test.is_passed());
    assert_eq!(
        store.load().unwrap(),
        CredentialRecord::new(PlatformId::Twitter, "tok", "sec")
    );
    assert_eq!(client.posted_content(), vec!["Hello to my workld!!".to_string()]);
}

#[tokio::test]
async fn test_rejected_smoke_test_keeps_saved_tokens() {
    let temp_dir = TempDir::new().unwrap();
    let store = TokenStore::new(temp_dir.path().join("tokens.json"));
    let auth = MockAuthenticator::success("tok", "sec");
    let client = MockPlatform::auth_failure("Invalid or expired token");

    let report = LoginFlow::new(&auth, &client, &store, no_delay())
        .run(&mut FixedPin("4242"))
        .await
        .unwrap();

    assert!(matches!(
        report.smoke_test,
        SmokeTestOutcome::Failed(SocialError::Unauthenticated(_))
    ));
    assert!(store.exists());
}

#[tokio::test]
async fn test_failed_exchange_leaves_no_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = TokenStore::new(temp_dir.path().join("tokens.json"));
    let auth = MockAuthenticator::failing_at(MockAuthFailure::Exchange);
    let client = MockPlatform::success("1", "u");

    let result = LoginFlow::new(&auth, &client, &store, no_delay())
        .run(&mut FixedPin("4242"))
        .await;

    assert!(matches!(result, Err(SocialError::RemoteFailure(_))));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    assert_eq!(client.post_call_count(), 0);
}
