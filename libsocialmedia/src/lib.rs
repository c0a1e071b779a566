//! socialmedia-cli - post to social platforms from the command line
//!
//! This library provides the pieces behind the `socialmedia-cli` binary:
//! the OAuth 1.0a login flow, the on-disk token store, platform clients,
//! and the dispatcher that routes a platform name to its client.

pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod logging;
pub mod login;
pub mod oauth;
pub mod platforms;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{CredentialRecord, TokenStore};
pub use dispatch::Dispatcher;
pub use error::{Result, SocialError};
pub use login::{LoginEvent, LoginInteraction, LoginReport, LoginStage, SmokeTestOutcome};
pub use platforms::PlatformId;
pub use types::PostResult;
