//! Mock platform implementation for testing
//!
//! Configurable stand-ins for a platform client and its authenticator. They
//! record every call so tests can verify the login and dispatch flows
//! without network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{Result, SocialError};
use crate::oauth::{AccessToken, RequestToken};
use crate::platforms::{Authenticator, Platform, PlatformId};
use crate::types::PostResult;

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub platform: PlatformId,

    /// Id returned by a successful post
    pub post_id: String,

    /// URL returned by a successful post
    pub post_url: String,

    /// Error message for a failed post; `None` means posting succeeds
    pub post_error: Option<String>,

    /// Reject posts as unauthenticated instead of as a remote failure
    pub post_error_is_auth: bool,

    /// Texts that have been posted, in order
    pub posted_content: Arc<Mutex<Vec<String>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            platform: PlatformId::Twitter,
            post_id: "123".to_string(),
            post_url: "https://x.com/status/123".to_string(),
            post_error: None,
            post_error_is_auth: false,
            posted_content: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform client
pub struct MockPlatform {
    config: MockConfig,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// A mock platform whose posts always succeed with the given id and url
    pub fn success(id: &str, url: &str) -> Self {
        Self::new(MockConfig {
            post_id: id.to_string(),
            post_url: url.to_string(),
            ..Default::default()
        })
    }

    /// A mock platform whose posts fail with a remote error
    pub fn post_failure(error: &str) -> Self {
        Self::new(MockConfig {
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// A mock platform whose posts are rejected as unauthenticated
    pub fn auth_failure(error: &str) -> Self {
        Self::new(MockConfig {
            post_error: Some(error.to_string()),
            post_error_is_auth: true,
            ..Default::default()
        })
    }

    pub fn post_call_count(&self) -> usize {
        self.posted_content().len()
    }

    pub fn posted_content(&self) -> Vec<String> {
        self.config
            .posted_content
            .lock()
            .map(|posted| posted.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn id(&self) -> PlatformId {
        self.config.platform
    }

    async fn post(&self, text: &str) -> Result<PostResult> {
        self.validate_content(text)?;

        if let Ok(mut posted) = self.config.posted_content.lock() {
            posted.push(text.to_string());
        }

        match &self.config.post_error {
            None => Ok(PostResult::new(
                self.config.post_id.clone(),
                self.config.post_url.clone(),
            )),
            Some(error) if self.config.post_error_is_auth => {
                Err(SocialError::Unauthenticated(error.clone()))
            }
            Some(error) => Err(SocialError::RemoteFailure(error.clone())),
        }
    }
}

/// Which handshake step a [`MockAuthenticator`] should fail at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockAuthFailure {
    RequestToken,
    Exchange,
}

/// Mock OAuth handshake
pub struct MockAuthenticator {
    platform: PlatformId,
    access_token: String,
    access_token_secret: String,
    failure: Option<MockAuthFailure>,
    verifiers: Arc<Mutex<Vec<String>>>,
}

impl MockAuthenticator {
    /// A handshake that succeeds and yields the given token pair
    pub fn success(access_token: &str, access_token_secret: &str) -> Self {
        Self {
            platform: PlatformId::Twitter,
            access_token: access_token.to_string(),
            access_token_secret: access_token_secret.to_string(),
            failure: None,
            verifiers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A handshake that fails at `step` with a network-style error
    pub fn failing_at(step: MockAuthFailure) -> Self {
        Self {
            failure: Some(step),
            ..Self::success("unused", "unused")
        }
    }

    /// Verifiers passed to `exchange`, in order
    pub fn received_verifiers(&self) -> Vec<String> {
        self.verifiers
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    fn id(&self) -> PlatformId {
        self.platform
    }

    async fn request_token(&self) -> Result<RequestToken> {
        if self.failure == Some(MockAuthFailure::RequestToken) {
            return Err(SocialError::RemoteFailure(
                "Failed to get request token: connection refused".to_string(),
            ));
        }

        Ok(RequestToken {
            token: "mock-request-token".to_string(),
            token_secret: "mock-request-secret".to_string(),
            callback_confirmed: true,
        })
    }

    fn authorization_url(&self, request_token: &RequestToken) -> String {
        format!(
            "https://mock.invalid/oauth/authorize?oauth_token={}",
            request_token.token
        )
    }

    async fn exchange(&self, _request_token: &RequestToken, verifier: &str) -> Result<AccessToken> {
        if let Ok(mut verifiers) = self.verifiers.lock() {
            verifiers.push(verifier.to_string());
        }

        if self.failure == Some(MockAuthFailure::Exchange) {
            return Err(SocialError::RemoteFailure(
                "Failed to get access token: connection reset".to_string(),
            ));
        }

        Ok(AccessToken {
            token: self.access_token.clone(),
            token_secret: self.access_token_secret.clone(),
            user_id: None,
            screen_name: None,
        })
    }
}
