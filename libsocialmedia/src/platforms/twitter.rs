//! Twitter platform implementation
//!
//! Posts through API v2 (`POST /2/tweets`) with OAuth 1.0a user-context
//! signatures. The handshake endpoints live under `/oauth/` on the
//! configured `oauth_url`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TwitterConfig;
use crate::credentials::TokenStore;
use crate::error::{Result, SocialError};
use crate::http::{build_client, map_http_failure, map_transport_error};
use crate::oauth::{AccessToken, OAuthClient, OAuthSigner, RequestToken};
use crate::platforms::{Authenticator, Platform, PlatformId};
use crate::types::PostResult;

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Twitter posting client
///
/// Holds no credentials of its own: the user token pair is read from the
/// [`TokenStore`] on every post, the consumer key pair from configuration.
pub struct TwitterClient {
    http: Client,
    config: TwitterConfig,
    store: TokenStore,
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig, store: TokenStore) -> Result<Self> {
        Ok(Self {
            http: build_client(config.timeout())?,
            config: config.clone(),
            store,
        })
    }

    fn tweets_endpoint(&self) -> String {
        format!("{}/2/tweets", self.config.api_url.trim_end_matches('/'))
    }

    /// Canonical URL for a post id
    pub fn status_url(&self, id: &str) -> String {
        self.config.status_url.replace("{id}", id)
    }
}

#[async_trait]
impl Platform for TwitterClient {
    fn id(&self) -> PlatformId {
        PlatformId::Twitter
    }

    async fn post(&self, text: &str) -> Result<PostResult> {
        self.validate_content(text)?;

        let record = self.store.load_for(PlatformId::Twitter)?;
        let (consumer_key, consumer_secret) = self.config.consumer()?;
        let signer = OAuthSigner::new(consumer_key, consumer_secret);

        let url = self.tweets_endpoint();
        // JSON bodies are not part of the OAuth 1.0a signature
        let header = signer.authorization_header(
            "POST",
            &url,
            &[],
            Some((record.access_token.as_str(), record.access_token_secret.as_str())),
        )?;

        tracing::debug!("Posting tweet ({} chars) to {}", text.chars().count(), url);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, header)
            .json(&CreateTweetRequest { text })
            .send()
            .await
            .map_err(|e| map_transport_error(e, "post tweet"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, "post tweet"))?;

        if !status.is_success() {
            tracing::warn!("Twitter rejected post with HTTP {}", status.as_u16());
            return Err(map_http_failure(status, &body, "Failed to post tweet"));
        }

        let created: CreateTweetResponse = serde_json::from_str(&body).map_err(|e| {
            SocialError::RemoteFailure(format!(
                "Invalid response from Twitter API: {} (body: {})",
                e,
                body.trim()
            ))
        })?;

        let url = self.status_url(&created.data.id);
        tracing::info!("Posted tweet {}", created.data.id);

        Ok(PostResult::new(created.data.id, url))
    }
}

/// Twitter OAuth 1.0a handshake
pub struct TwitterAuthenticator {
    client: OAuthClient,
}

impl TwitterAuthenticator {
    /// # Errors
    ///
    /// Returns `SocialError::Config` if the consumer key pair is not configured.
    pub fn new(config: &TwitterConfig) -> Result<Self> {
        let (consumer_key, consumer_secret) = config.consumer()?;
        let http = build_client(config.timeout())?;

        Ok(Self {
            client: OAuthClient::new(
                OAuthSigner::new(consumer_key, consumer_secret),
                http,
                config.oauth_url.clone(),
            ),
        })
    }
}

#[async_trait]
impl Authenticator for TwitterAuthenticator {
    fn id(&self) -> PlatformId {
        PlatformId::Twitter
    }

    async fn request_token(&self) -> Result<RequestToken> {
        self.client.request_token().await
    }

    fn authorization_url(&self, request_token: &RequestToken) -> String {
        self.client.authorization_url(request_token)
    }

    async fn exchange(&self, request_token: &RequestToken, verifier: &str) -> Result<AccessToken> {
        self.client.access_token(request_token, verifier).await
    }
}
