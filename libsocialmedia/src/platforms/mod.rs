//! Platform abstraction and implementations
//!
//! Each supported platform is one variant of [`PlatformId`]. A platform
//! provides two halves:
//!
//! - a [`Platform`] client that publishes a text post with stored credentials
//! - an [`Authenticator`] that drives the OAuth 1.0a handshake during login
//!
//! # Examples
//!
//! ```no_run
//! use libsocialmedia::config::Config;
//! use libsocialmedia::credentials::TokenStore;
//! use libsocialmedia::platforms::{twitter::TwitterClient, Platform};
//!
//! # async fn example() -> libsocialmedia::Result<()> {
//! let config = Config::load()?;
//! let store = TokenStore::new(config.token_path()?);
//! let client = TwitterClient::new(&config.twitter, store)?;
//!
//! let result = client.post("Hello from the command line!").await?;
//! println!("{} -> {}", result.id, result.url);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, SocialError};
use crate::oauth::{AccessToken, RequestToken};
use crate::types::PostResult;

pub mod twitter;

// Public so integration tests under tests/ can drive the login flow offline
pub mod mock;

/// Supported platforms
///
/// The string form is used uniformly by the CLI, the dispatcher and the
/// credential file's `platform` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Twitter,
}

impl PlatformId {
    /// Every registered platform, in display order
    pub const ALL: &'static [PlatformId] = &[PlatformId::Twitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Twitter => "twitter",
        }
    }

    /// Comma-separated list of registered keys, for error messages and help text
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(PlatformId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for PlatformId {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == key)
            .ok_or_else(|| SocialError::UnsupportedPlatform(s.trim().to_string()))
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publishes posts on behalf of the user
#[async_trait]
pub trait Platform: Send + Sync {
    fn id(&self) -> PlatformId;

    /// Lowercase platform name (e.g., "twitter")
    fn name(&self) -> &str {
        self.id().as_str()
    }

    /// Local checks before any I/O
    ///
    /// Length limits are enforced remotely; locally the text must only be
    /// non-empty.
    ///
    /// # Errors
    ///
    /// Returns `SocialError::InvalidInput` for empty or whitespace-only text.
    fn validate_content(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(SocialError::InvalidInput(
                "Message cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load stored credentials and submit `text` as a new post
    ///
    /// Makes exactly one remote call attempt.
    ///
    /// # Errors
    ///
    /// - `SocialError::InvalidInput` if `text` is empty
    /// - `SocialError::MissingCredentials` / `CorruptCredentials` from the token store
    /// - `SocialError::Unauthenticated` if the platform rejects the tokens
    /// - `SocialError::RemoteFailure` for any other remote error
    async fn post(&self, text: &str) -> Result<PostResult>;
}

/// Obtains access tokens through the platform's OAuth 1.0a handshake
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn id(&self) -> PlatformId;

    async fn request_token(&self) -> Result<RequestToken>;

    fn authorization_url(&self, request_token: &RequestToken) -> String;

    async fn exchange(&self, request_token: &RequestToken, verifier: &str) -> Result<AccessToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_platform() {
        assert_eq!("twitter".parse::<PlatformId>().unwrap(), PlatformId::Twitter);
        assert_eq!(" Twitter ".parse::<PlatformId>().unwrap(), PlatformId::Twitter);
    }

    #[test]
    fn test_parse_unknown_platform() {
        for name in ["facebook", "unknownplatform", "", "twitterx"] {
            match name.parse::<PlatformId>() {
                Err(SocialError::UnsupportedPlatform(got)) => assert_eq!(got, name.trim()),
                other => panic!("Expected UnsupportedPlatform for {:?}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_display_matches_key() {
        for platform in PlatformId::ALL {
            assert_eq!(platform.to_string(), platform.as_str());
            assert_eq!(platform.as_str().parse::<PlatformId>().unwrap(), *platform);
        }
    }

    #[test]
    fn test_serde_uses_lowercase_key() {
        assert_eq!(
            serde_json::to_string(&PlatformId::Twitter).unwrap(),
            "\"twitter\""
        );
        assert_eq!(
            serde_json::from_str::<PlatformId>("\"twitter\"").unwrap(),
            PlatformId::Twitter
        );
    }

    #[test]
    fn test_supported_list() {
        assert_eq!(PlatformId::supported_list(), "twitter");
    }
}
