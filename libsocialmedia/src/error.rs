//! Error types for socialmedia-cli

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocialError>;

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("No credentials found at {}. Run `socialmedia-cli login <platform>` first.", .0.display())]
    MissingCredentials(PathBuf),

    #[error("Credential file is corrupt: {0}")]
    CorruptCredentials(String),

    #[error("Authentication rejected: {0}")]
    Unauthenticated(String),

    #[error("Remote request failed: {0}")]
    RemoteFailure(String),

    #[error("Credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SocialError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SocialError::InvalidInput(_) => 3,
            SocialError::Unauthenticated(_) => 2,
            SocialError::UnsupportedPlatform(_) => 1,
            SocialError::MissingCredentials(_) => 1,
            SocialError::CorruptCredentials(_) => 1,
            SocialError::RemoteFailure(_) => 1,
            SocialError::Io(_) => 1,
            SocialError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
