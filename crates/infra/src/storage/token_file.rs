//! JSON token file
//!
//! The file holds exactly `{access_token, refresh_token, token_type,
//! expires_in}`. Writes go to a sibling temp file which is then renamed over
//! the target, so a crash never leaves a half-written token file behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loopauth_core::TokenStore;
use loopauth_domain::{AuthError, Result, TokenSet};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::InfraError;

/// [`TokenStore`] backed by a single JSON file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time of the token file, `None` if it does not exist.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the metadata cannot be read.
    pub async fn modified_at(&self) -> Result<Option<DateTime<Utc>>> {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => Ok(Some(DateTime::<Utc>::from(metadata.modified().map_err(io_error)?))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(err)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_atomically(&self, contents: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let temp = self.temp_path();
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp).await.map_err(io_error)?;
        file.write_all(contents).await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);

        if let Err(err) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(io_error(err));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No token file");
                return Ok(None);
            }
            Err(err) => return Err(io_error(err)),
        };

        let tokens: TokenSet = serde_json::from_slice(&contents).map_err(|err| {
            AuthError::Storage(format!("{}: malformed token file: {err}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "Token file loaded");
        Ok(Some(tokens))
    }

    async fn save(&self, tokens: &TokenSet) -> Result<()> {
        let contents = serde_json::to_vec_pretty(tokens)
            .map_err(|err| AuthError::from(InfraError::from(err)))?;
        self.write_atomically(&contents).await?;
        info!(path = %self.path.display(), "Tokens saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Token file removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}

fn io_error(err: std::io::Error) -> AuthError {
    InfraError::from(err).into()
}
