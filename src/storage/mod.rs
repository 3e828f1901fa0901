//! Durable credential storage.
//!
//! The session's token pair survives process restarts through a small
//! key-value shadow. Absence of either token means "unauthenticated".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::error::Error;

/// Persisted token pair, keyed by the same names the platform's other
/// clients use for their stored credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredTokens {
    #[serde(rename = "token")]
    pub access_token: String,
    pub refresh_token: String,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredTokens>, Error>;
    async fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), Error>;
    async fn clear(&self) -> Result<(), Error>;
}

/// File-backed store holding the token pair as a small JSON document.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredTokens>, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let tokens: StoredTokens = serde_json::from_slice(&bytes)?;
                Ok(Some(tokens))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tokens = StoredTokens {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&tokens)?;
        tokio::fs::write(&self.path, bytes).await?;

        // Credentials file should not be world-readable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms).await?;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<StoredTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredTokens>, Error> {
        Ok(self.tokens.read().await.clone())
    }

    async fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), Error> {
        *self.tokens.write().await = Some(StoredTokens {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        });
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        *self.tokens.write().await = None;
        Ok(())
    }
}
