//! Login flow: OAuth 1.0a handshake, token persistence and a smoke test
//!
//! The flow is a fixed sequence of [`LoginStage`]s:
//!
//! 1. `RequestToken` - temporary token from the platform
//! 2. `AwaitAuthorization` - user opens the URL and returns a PIN
//! 3. `ExchangeToken` - PIN traded for the access token pair
//! 4. `Persist` - credential record written through the [`TokenStore`]
//! 5. `SmokeTest` - after the configured delay, one verification post
//!
//! Failure in stages 1-3 aborts before anything is written. A failed smoke
//! test is reported in the [`LoginReport`] but leaves the saved tokens in
//! place; there is no rollback edge.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::LoginConfig;
use crate::credentials::{CredentialRecord, TokenStore};
use crate::error::{Result, SocialError};
use crate::platforms::{Authenticator, Platform, PlatformId};
use crate::types::PostResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    RequestToken,
    AwaitAuthorization,
    ExchangeToken,
    Persist,
    SmokeTest,
}

impl LoginStage {
    pub const ALL: [LoginStage; 5] = [
        LoginStage::RequestToken,
        LoginStage::AwaitAuthorization,
        LoginStage::ExchangeToken,
        LoginStage::Persist,
        LoginStage::SmokeTest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LoginStage::RequestToken => "request token",
            LoginStage::AwaitAuthorization => "await authorization",
            LoginStage::ExchangeToken => "exchange token",
            LoginStage::Persist => "persist",
            LoginStage::SmokeTest => "smoke test",
        }
    }
}

/// Progress notifications emitted while the flow runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    StageStarted(LoginStage),
    TokensSaved(PathBuf),
    WaitingBeforeSmokeTest(Duration),
}

/// The user-facing side of login
///
/// `verifier` blocks until the user has authorized the application in a
/// browser and typed back the PIN.
pub trait LoginInteraction {
    fn verifier(&mut self, platform: PlatformId, authorization_url: &str) -> Result<String>;

    fn notify(&mut self, _event: LoginEvent) {}
}

#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub smoke_test_delay: Duration,
    pub smoke_test_text: String,
}

impl From<&LoginConfig> for LoginOptions {
    fn from(config: &LoginConfig) -> Self {
        Self {
            smoke_test_delay: config.smoke_test_delay(),
            smoke_test_text: config.smoke_test_text.clone(),
        }
    }
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self::from(&LoginConfig::default())
    }
}

#[derive(Debug)]
pub enum SmokeTestOutcome {
    Passed(PostResult),
    Failed(SocialError),
}

impl SmokeTestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, SmokeTestOutcome::Passed(_))
    }
}

#[derive(Debug)]
pub struct LoginReport {
    pub platform: PlatformId,
    pub token_path: PathBuf,
    pub screen_name: Option<String>,
    pub smoke_test: SmokeTestOutcome,
}

/// One login attempt for one platform
pub struct LoginFlow<'a> {
    authenticator: &'a dyn Authenticator,
    client: &'a dyn Platform,
    store: &'a TokenStore,
    options: LoginOptions,
}

impl<'a> LoginFlow<'a> {
    pub fn new(
        authenticator: &'a dyn Authenticator,
        client: &'a dyn Platform,
        store: &'a TokenStore,
        options: LoginOptions,
    ) -> Self {
        Self {
            authenticator,
            client,
            store,
            options,
        }
    }

    pub async fn run(&self, interaction: &mut dyn LoginInteraction) -> Result<LoginReport> {
        let platform = self.authenticator.id();

        self.enter(interaction, LoginStage::RequestToken);
        let request_token = self.authenticator.request_token().await?;
        if !request_token.callback_confirmed {
            tracing::warn!("{} did not confirm the out-of-band callback", platform);
        }

        self.enter(interaction, LoginStage::AwaitAuthorization);
        let authorization_url = self.authenticator.authorization_url(&request_token);
        let verifier = interaction.verifier(platform, &authorization_url)?;
        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(SocialError::InvalidInput(
                "Authorization PIN cannot be empty".to_string(),
            ));
        }

        self.enter(interaction, LoginStage::ExchangeToken);
        let access = self.authenticator.exchange(&request_token, verifier).await?;

        self.enter(interaction, LoginStage::Persist);
        let record = CredentialRecord::new(platform, access.token, access.token_secret);
        self.store.save(&record)?;
        tracing::info!("Saved {} tokens to {:?}", platform, self.store.path());
        interaction.notify(LoginEvent::TokensSaved(self.store.path().to_path_buf()));

        self.enter(interaction, LoginStage::SmokeTest);
        let smoke_test = self.smoke_test(interaction).await;

        Ok(LoginReport {
            platform,
            token_path: self.store.path().to_path_buf(),
            screen_name: access.screen_name,
            smoke_test,
        })
    }

    fn enter(&self, interaction: &mut dyn LoginInteraction, stage: LoginStage) {
        tracing::debug!("Login stage: {}", stage.label());
        interaction.notify(LoginEvent::StageStarted(stage));
    }

    async fn smoke_test(&self, interaction: &mut dyn LoginInteraction) -> SmokeTestOutcome {
        let delay = self.options.smoke_test_delay;
        if !delay.is_zero() {
            interaction.notify(LoginEvent::WaitingBeforeSmokeTest(delay));
            tokio::time::sleep(delay).await;
        }

        match self.client.post(&self.options.smoke_test_text).await {
            Ok(result) => {
                tracing::info!("Smoke test passed: {}", result.url);
                SmokeTestOutcome::Passed(result)
            }
            Err(e) => {
                tracing::warn!("Smoke test failed, keeping saved tokens: {}", e);
                SmokeTestOutcome::Failed(e)
            }
        }
    }
}
