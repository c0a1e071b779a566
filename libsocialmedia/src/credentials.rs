//! Token Store: the single on-disk credential record
//!
//! The record is one JSON object:
//!
//! ```json
//! {"access_token":"tok","access_token_secret":"sec","platform":"twitter"}
//! ```
//!
//! Each login replaces the whole file. Writes go to a randomly named sibling
//! temp file (created exclusively, mode 0600 on Unix) that is renamed into
//! place, so readers never observe a half-written record.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Result, SocialError};
use crate::platforms::PlatformId;

/// Persisted access token pair for one platform
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: String,
    pub access_token_secret: String,
    pub platform: PlatformId,
}

impl CredentialRecord {
    pub fn new(
        platform: PlatformId,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
            platform,
        }
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"[REDACTED]")
            .field("platform", &self.platform)
            .finish()
    }
}

/// File-backed store for the credential record
///
/// Cloning is cheap; clones refer to the same path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the stored record
    ///
    /// # Errors
    ///
    /// Returns `SocialError::Io` if the directory is not writable.
    pub fn save(&self, record: &CredentialRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| SocialError::CorruptCredentials(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        write_owner_only(&self.path, json.as_bytes())?;

        tracing::debug!(
            "Saved {} credentials to {:?}",
            record.platform,
            self.path
        );
        Ok(())
    }

    /// Read the stored record
    ///
    /// # Errors
    ///
    /// - `SocialError::MissingCredentials` if the file does not exist
    /// - `SocialError::CorruptCredentials` if it is not a valid record
    /// - `SocialError::Io` for any other read failure, including a symlinked file
    pub fn load(&self) -> Result<CredentialRecord> {
        if !self.path.exists() {
            return Err(SocialError::MissingCredentials(self.path.clone()));
        }

        validate_not_symlink(&self.path)?;

        let content = std::fs::read_to_string(&self.path)?;
        let record: CredentialRecord = serde_json::from_str(&content)
            .map_err(|e| SocialError::CorruptCredentials(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!("Loaded {} credentials from {:?}", record.platform, self.path);
        Ok(record)
    }

    /// Read the record, requiring it to belong to `platform`
    pub fn load_for(&self, platform: PlatformId) -> Result<CredentialRecord> {
        let record = self.load()?;
        if record.platform != platform {
            tracing::warn!(
                "Credential file holds {} tokens, not {}",
                record.platform,
                platform
            );
            return Err(SocialError::MissingCredentials(self.path.clone()));
        }
        Ok(record)
    }
}

/// Write `contents` to a fresh randomly named file beside `path`, then rename
/// it over `path`
///
/// The temp file is created exclusively with mode 0600, so a planted file or
/// symlink at a predictable name is never written through.
fn write_owner_only(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    // Dropping the handle on error removes the temp file
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Reject credential paths that are symbolic links
pub fn validate_not_symlink(path: &Path) -> Result<()> {
    let metadata = std::fs::symlink_metadata(path)?;

    if metadata.file_type().is_symlink() {
        return Err(SocialError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "Credential file '{}' is a symbolic link; refusing to read it",
                path.display()
            ),
        )));
    }

    Ok(())
}
