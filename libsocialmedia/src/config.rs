//! Configuration management for socialmedia-cli
//!
//! Settings come from three layers, later layers winning:
//! built-in defaults, the TOML config file, and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const DEFAULT_TOKEN_PATH: &str = "~/.socialmedia_cli_tokens.json";
pub const DEFAULT_TWITTER_API_URL: &str = "https://api.twitter.com";
pub const DEFAULT_TWITTER_STATUS_URL: &str = "https://twitter.com/user/status/{id}";
pub const DEFAULT_SMOKE_TEST_TEXT: &str = "Hello to my workld!!";
pub const DEFAULT_SMOKE_TEST_DELAY_SECS: u64 = 60;

/// Legacy config location, relative to the home directory
const LEGACY_CONFIG_PATH: &str = ".socialmedia_cli/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub twitter: TwitterConfig,
    pub login: LoginConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Location of the token file (tilde is expanded)
    pub path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_TOKEN_PATH.to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    /// Base URL for API v2 calls
    pub api_url: String,
    /// Base URL for the OAuth 1.0a endpoints
    pub oauth_url: String,
    /// Template for the canonical post URL; `{id}` is replaced by the post id
    pub status_url: String,
    pub timeout_secs: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: None,
            consumer_secret: None,
            api_url: DEFAULT_TWITTER_API_URL.to_string(),
            oauth_url: DEFAULT_TWITTER_API_URL.to_string(),
            status_url: DEFAULT_TWITTER_STATUS_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

// Manual impl keeps the consumer secret out of logs.
impl std::fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_url", &self.api_url)
            .field("oauth_url", &self.oauth_url)
            .field("status_url", &self.status_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl TwitterConfig {
    /// Consumer (application) key pair, required for every signed request
    pub fn consumer(&self) -> Result<(String, String)> {
        let key = self
            .consumer_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingField(
                    "twitter.consumer_key (or TWITTER_CONSUMER_KEY)".to_string(),
                )
            })?;
        let secret = self
            .consumer_secret
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingField(
                    "twitter.consumer_secret (or TWITTER_CONSUMER_SECRET)".to_string(),
                )
            })?;
        Ok((key, secret))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Pause between saving tokens and the verification post
    pub smoke_test_delay_secs: u64,
    pub smoke_test_text: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            smoke_test_delay_secs: DEFAULT_SMOKE_TEST_DELAY_SECS,
            smoke_test_text: DEFAULT_SMOKE_TEST_TEXT.to_string(),
        }
    }
}

impl LoginConfig {
    pub fn smoke_test_delay(&self) -> Duration {
        Duration::from_secs(self.smoke_test_delay_secs)
    }
}

impl Config {
    /// Load configuration from the default location, then apply environment overrides
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!("No config file at {:?}, using defaults", config_path);
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply environment variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(key) = non_empty_env("TWITTER_CONSUMER_KEY") {
            self.twitter.consumer_key = Some(key);
        }
        if let Some(secret) = non_empty_env("TWITTER_CONSUMER_SECRET") {
            self.twitter.consumer_secret = Some(secret);
        }
        if let Some(path) = non_empty_env("SOCIALMEDIA_CLI_TOKEN_PATH") {
            self.credentials.path = path;
        }
        if let Some(delay) = non_empty_env("SOCIALMEDIA_CLI_SMOKE_TEST_DELAY_SECS") {
            self.login.smoke_test_delay_secs =
                delay.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "SOCIALMEDIA_CLI_SMOKE_TEST_DELAY_SECS".to_string(),
                    reason: format!("'{}' is not a whole number of seconds", delay),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.twitter.status_url.contains("{id}") {
            return Err(ConfigError::InvalidValue {
                field: "twitter.status_url".to_string(),
                reason: "must contain {id}".to_string(),
            }
            .into());
        }
        if self.credentials.path.trim().is_empty() {
            return Err(ConfigError::MissingField("credentials.path".to_string()).into());
        }
        Ok(())
    }

    /// Token file path with `~` and environment variables expanded
    pub fn token_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.credentials.path).map_err(|e| {
            ConfigError::InvalidValue {
                field: "credentials.path".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the configuration file path
///
/// `$SOCIALMEDIA_CLI_CONFIG` wins. Otherwise the XDG location is used, unless
/// only the legacy `~/.socialmedia_cli/config.toml` exists.
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SOCIALMEDIA_CLI_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;
    let primary = config_dir.join("socialmedia-cli").join("config.toml");
    let legacy = dirs::home_dir().map(|home| home.join(LEGACY_CONFIG_PATH));

    Ok(select_config_path(primary, legacy))
}

fn select_config_path(primary: PathBuf, legacy: Option<PathBuf>) -> PathBuf {
    if primary.exists() {
        return primary;
    }
    match legacy {
        Some(legacy) if legacy.exists() => {
            tracing::debug!("Using legacy config file at {:?}", legacy);
            legacy
        }
        _ => primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        for var in [
            "TWITTER_CONSUMER_KEY",
            "TWITTER_CONSUMER_SECRET",
            "SOCIALMEDIA_CLI_TOKEN_PATH",
            "SOCIALMEDIA_CLI_SMOKE_TEST_DELAY_SECS",
            "SOCIALMEDIA_CLI_CONFIG",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.credentials.path, "~/.socialmedia_cli_tokens.json");
        assert_eq!(config.twitter.api_url, "https://api.twitter.com");
        assert_eq!(config.login.smoke_test_delay(), Duration::from_secs(60));
        assert_eq!(config.login.smoke_test_text, "Hello to my workld!!");
        assert!(config.twitter.consumer_key.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[twitter]
consumer_key = "ckey"
consumer_secret = "csecret"

[login]
smoke_test_delay_secs = 0
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.twitter.consumer_key.as_deref(), Some("ckey"));
        assert_eq!(config.login.smoke_test_delay(), Duration::ZERO);
        assert_eq!(config.login.smoke_test_text, DEFAULT_SMOKE_TEST_TEXT);
        assert_eq!(config.credentials.path, DEFAULT_TOKEN_PATH);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[twitter\nconsumer_key = ").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::SocialError::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_consumer_requires_both_halves() {
        let mut twitter = TwitterConfig {
            consumer_key: Some("ckey".to_string()),
            ..Default::default()
        };
        assert!(twitter.consumer().is_err());

        twitter.consumer_secret = Some("   ".to_string());
        assert!(twitter.consumer().is_err());

        twitter.consumer_secret = Some("csecret".to_string());
        assert_eq!(
            twitter.consumer().unwrap(),
            ("ckey".to_string(), "csecret".to_string())
        );
    }

    #[test]
    fn test_debug_redacts_consumer_secret() {
        let twitter = TwitterConfig {
            consumer_key: Some("ckey".to_string()),
            consumer_secret: Some("super-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", twitter);
        assert!(debug.contains("ckey"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_status_url_must_contain_placeholder() {
        let mut config = Config::default();
        config.twitter.status_url = "https://twitter.com/status".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        clear_env();
        std::env::set_var("TWITTER_CONSUMER_KEY", "env-key");
        std::env::set_var("TWITTER_CONSUMER_SECRET", "env-secret");
        std::env::set_var("SOCIALMEDIA_CLI_TOKEN_PATH", "/tmp/custom-tokens.json");
        std::env::set_var("SOCIALMEDIA_CLI_SMOKE_TEST_DELAY_SECS", "5");

        let mut config = Config::default();
        config.twitter.consumer_key = Some("file-key".to_string());
        config.apply_env_overrides().unwrap();

        assert_eq!(config.twitter.consumer_key.as_deref(), Some("env-key"));
        assert_eq!(config.twitter.consumer_secret.as_deref(), Some("env-secret"));
        assert_eq!(
            config.token_path().unwrap(),
            PathBuf::from("/tmp/custom-tokens.json")
        );
        assert_eq!(config.login.smoke_test_delay(), Duration::from_secs(5));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_invalid_delay_is_rejected() {
        clear_env();
        std::env::set_var("SOCIALMEDIA_CLI_SMOKE_TEST_DELAY_SECS", "soon");

        let mut config = Config::default();
        let err = config.apply_env_overrides().unwrap_err();
        assert!(err.to_string().contains("SOCIALMEDIA_CLI_SMOKE_TEST_DELAY_SECS"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        std::env::set_var("SOCIALMEDIA_CLI_CONFIG", path.to_str().unwrap());

        let config = Config::load().unwrap();
        assert_eq!(config.credentials.path, DEFAULT_TOKEN_PATH);

        clear_env();
    }

    #[test]
    fn test_token_path_expands_tilde() {
        let config = Config::default();
        let path = config.token_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".socialmedia_cli_tokens.json"));
    }

    #[test]
    fn test_select_config_path_prefers_primary() {
        let temp_dir = TempDir::new().unwrap();
        let primary = temp_dir.path().join("xdg/config.toml");
        let legacy = temp_dir.path().join("legacy/config.toml");
        for path in [&primary, &legacy] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }

        assert_eq!(select_config_path(primary.clone(), Some(legacy)), primary);
    }

    #[test]
    fn test_select_config_path_falls_back_to_legacy() {
        let temp_dir = TempDir::new().unwrap();
        let primary = temp_dir.path().join("xdg/config.toml");
        let legacy = temp_dir.path().join("legacy/config.toml");
        std::fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        std::fs::write(&legacy, "").unwrap();

        assert_eq!(select_config_path(primary, Some(legacy.clone())), legacy);
    }

    #[test]
    fn test_select_config_path_defaults_to_primary() {
        let temp_dir = TempDir::new().unwrap();
        let primary = temp_dir.path().join("xdg/config.toml");
        let legacy = temp_dir.path().join("legacy/config.toml");

        assert_eq!(select_config_path(primary.clone(), Some(legacy)), primary);
        assert_eq!(select_config_path(primary.clone(), None), primary);
    }
}
