//! Storage for the single access token.
//!
//! Every backend keeps at most one token under the fixed key
//! [`TOKEN_KEY`]. Writes are last-write-wins; the refresh path in
//! [`crate::api::HttpClient`] is the only writer besides login and logout.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Key the access token is stored under.
pub const TOKEN_KEY: &str = "access_token";

/// Keychain service name
const SERVICE_NAME: &str = "debo";

/// Application directory name under the platform cache dir
const APP_NAME: &str = "debo";

/// Token file name in the cache directory
const TOKEN_FILE: &str = "token.json";

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed token file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Could not find cache directory")]
    NoCacheDir,
}

/// Process-wide holder of the current access token.
pub trait TokenStore: Send + Sync {
    /// Current token, if any. Read failures are reported as absent.
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<(), TokenStoreError>;

    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    stored_at: DateTime<Utc>,
}

/// JSON file backed store that survives restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<cache dir>/debo/token.json`.
    pub fn default_location() -> Result<Self, TokenStoreError> {
        let cache_dir = dirs::cache_dir().ok_or(TokenStoreError::NoCacheDir)?;
        Ok(Self::new(cache_dir.join(APP_NAME).join(TOKEN_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the current token was written, if one is stored.
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.read().ok().flatten().map(|t| t.stored_at)
    }

    fn read(&self) -> Result<Option<StoredToken>, TokenStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match self.read() {
            Ok(stored) => stored.map(|t| t.access_token),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token file");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredToken {
            access_token: token.to_string(),
            stored_at: Utc::now(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        debug!(path = %self.path.display(), "Stored access token");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// OS keychain backed store.
#[derive(Debug, Clone, Default)]
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self
    }

    fn entry() -> Result<Entry, TokenStoreError> {
        Ok(Entry::new(SERVICE_NAME, TOKEN_KEY)?)
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Option<String> {
        match Self::entry().and_then(|entry| entry.get_password().map_err(TokenStoreError::from)) {
            Ok(token) => Some(token),
            Err(TokenStoreError::Keyring(keyring::Error::NoEntry)) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read access token from keychain");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        Self::entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), None);

        store.set("abc").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc"));

        store.set("def").unwrap();
        assert_eq!(store.get().as_deref(), Some("def"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryTokenStore::with_token("shared");
        let other = store.clone();
        other.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(TOKEN_FILE);

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get(), None);
        assert!(store.stored_at().is_none());

        store.set("persisted").unwrap();
        assert!(path.exists());
        assert!(store.stored_at().is_some());

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get().as_deref(), Some("persisted"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_file_store_uses_fixed_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(TOKEN_FILE));
        store.set("tok").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw[TOKEN_KEY], "tok");
    }

    #[test]
    fn test_file_store_treats_corrupt_file_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get(), None);

        // Clearing still removes the bad file
        store.clear().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(TOKEN_FILE));
        assert!(store.clear().is_ok());
    }
}
