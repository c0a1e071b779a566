//! Routes a platform name to its client and authenticator
//!
//! Names are resolved against [`PlatformId`] before any configuration
//! lookup, network call or token file access happens, so an unknown
//! platform never has side effects.

use crate::config::Config;
use crate::credentials::TokenStore;
use crate::error::Result;
use crate::login::{LoginFlow, LoginInteraction, LoginOptions, LoginReport};
use crate::platforms::twitter::{TwitterAuthenticator, TwitterClient};
use crate::platforms::{Authenticator, Platform, PlatformId};
use crate::types::PostResult;

pub struct Dispatcher {
    config: Config,
    store: TokenStore,
}

impl Dispatcher {
    pub fn new(config: Config, store: TokenStore) -> Self {
        Self { config, store }
    }

    /// Build a dispatcher from configuration, using its token path
    pub fn from_config(config: Config) -> Result<Self> {
        let store = TokenStore::new(config.token_path()?);
        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// # Errors
    ///
    /// Returns `SocialError::UnsupportedPlatform` for unknown names.
    pub fn resolve(name: &str) -> Result<PlatformId> {
        name.parse()
    }

    pub fn client(&self, platform: PlatformId) -> Result<Box<dyn Platform>> {
        match platform {
            PlatformId::Twitter => Ok(Box::new(TwitterClient::new(
                &self.config.twitter,
                self.store.clone(),
            )?)),
        }
    }

    pub fn authenticator(&self, platform: PlatformId) -> Result<Box<dyn Authenticator>> {
        match platform {
            PlatformId::Twitter => Ok(Box::new(TwitterAuthenticator::new(&self.config.twitter)?)),
        }
    }

    /// Publish `text` on the named platform
    pub async fn post(&self, name: &str, text: &str) -> Result<PostResult> {
        let platform = Self::resolve(name)?;
        tracing::debug!("Dispatching post to {}", platform);

        self.client(platform)?.post(text).await
    }

    /// Run the interactive login flow for the named platform
    pub async fn login(
        &self,
        name: &str,
        interaction: &mut dyn LoginInteraction,
    ) -> Result<LoginReport> {
        let platform = Self::resolve(name)?;
        tracing::debug!("Dispatching login to {}", platform);

        let authenticator = self.authenticator(platform)?;
        let client = self.client(platform)?;
        let options = LoginOptions::from(&self.config.login);

        LoginFlow::new(authenticator.as_ref(), client.as_ref(), &self.store, options)
            .run(interaction)
            .await
    }
}
