use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{SessionToken, SsoToken};

/// Token pair persisted between runs, with the time it was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTokens {
    pub session_token: SessionToken,
    pub sso_token: SsoToken,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

impl CachedTokens {
    /// Capture a token pair as of now.
    #[must_use]
    pub fn new(session_token: SessionToken, sso_token: SsoToken) -> Self {
        Self {
            session_token,
            sso_token,
            saved_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Persistence for the cached token pair.
///
/// `load` distinguishes "nothing cached" (`Ok(None)`) from a cache that
/// exists but cannot be read back (`Err`); callers decide whether either
/// is fatal.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(
        &self,
    ) -> Result<Option<CachedTokens>, Box<dyn std::error::Error + Send + Sync>>;

    async fn store(
        &self,
        tokens: &CachedTokens,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// [`TokenStore`] backed by a JSON file.
///
/// Parent directories are created on first write. A missing file loads
/// as `Ok(None)`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(
        &self,
    ) -> Result<Option<CachedTokens>, Box<dyn std::error::Error + Send + Sync>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    async fn store(
        &self,
        tokens: &CachedTokens,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let raw = serde_json::to_vec_pretty(tokens)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}
