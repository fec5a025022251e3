//! Session storage implementations.
//!
//! Each key of the namespace is one file, `<root>/<key>.json`:
//! ```text
//! ~/.local/share/classdesk/
//!   auth-storage.json
//! ```
//! Writes go to a temporary file first and are renamed into place, so a
//! crash mid-write leaves the previous value intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use classdesk_application::ports::{FileSystem, FileSystemError, SessionStorage, StorageError};
use classdesk_domain::session::SESSION_STORAGE_KEY;
use parking_lot::Mutex;
use serde_json::Value;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const ENTRY_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// File-based session storage rooted at one namespace directory.
#[derive(Debug, Clone)]
pub struct FileSessionStorage<F> {
    fs: F,
    root: PathBuf,
}

impl<F: FileSystem> FileSessionStorage<F> {
    /// Creates a storage keeping its files under `root`.
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    /// Creates a storage under the platform data directory, in a folder
    /// named after `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no data directory.
    pub fn in_data_dir(fs: F, namespace: &str) -> Result<Self, StorageError> {
        let base = dirs::data_local_dir().ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no local data directory on this platform",
            ))
        })?;
        Ok(Self::new(fs, base.join(namespace)))
    }

    /// The namespace directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{TEMP_EXTENSION}"))
    }
}

#[async_trait]
impl<F: FileSystem> SessionStorage for FileSessionStorage<F> {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        match self.fs.read_file(&self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(FileSystemError::NotFound(_)) => Ok(None),
            Err(e) => Err(StorageError::Io(e.into())),
        }
    }

    async fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        let document: Value =
            from_json_bytes(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let content = to_json_stable_bytes(&document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.fs
            .create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Io(e.into()))?;

        let temp = self.temp_path(key);
        self.fs
            .write_file(&temp, &content)
            .await
            .map_err(|e| StorageError::Io(e.into()))?;
        self.fs
            .rename(&temp, &self.entry_path(key))
            .await
            .map_err(|e| StorageError::Io(e.into()))?;

        tracing::trace!(key, path = %self.root.display(), "stored entry");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        if !self.fs.exists(&self.root).await {
            return Ok(());
        }
        let mut entries = self
            .fs
            .read_dir(&self.root)
            .await
            .map_err(|e| StorageError::Io(e.into()))?;

        // Session entry first.
        let session = self.entry_path(SESSION_STORAGE_KEY);
        if let Some(position) = entries.iter().position(|entry| *entry == session) {
            let entry = entries.remove(position);
            entries.insert(0, entry);
        }

        let mut first_error = None;
        for entry in entries {
            let removed = if self.fs.is_dir(&entry).await {
                self.fs.remove_dir_all(&entry).await
            } else {
                self.fs.remove_file(&entry).await
            };
            match removed {
                Ok(()) | Err(FileSystemError::NotFound(_)) => {}
                Err(e) => {
                    tracing::warn!(path = %entry.display(), error = %e, "failed to remove entry");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(StorageError::Io(e.into()));
        }
        tracing::debug!(path = %self.root.display(), "wiped storage namespace");
        Ok(())
    }
}

/// In-memory session storage for tests and sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySessionStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    /// Returns the stored keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TokioFileSystem;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entry_path() {
        let storage = FileSessionStorage::new(TokioFileSystem, "/data/classdesk");
        assert_eq!(
            storage.entry_path("auth-storage"),
            PathBuf::from("/data/classdesk/auth-storage.json")
        );
    }

    #[test]
    fn test_key_validation() {
        assert!(validate_key("auth-storage").is_ok());
        assert!(validate_key("ui_prefs2").is_ok());
        assert!(matches!(
            validate_key("../escape"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(validate_key("").is_err());
    }

    #[tokio::test]
    async fn test_memory_storage_roundtrip_and_clear() {
        let storage = MemorySessionStorage::new();
        storage.save("auth-storage", b"{}").await.unwrap();
        storage.save("ui-preferences", b"[]").await.unwrap();

        assert_eq!(storage.load("auth-storage").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.keys(), vec!["auth-storage", "ui-preferences"]);

        storage.clear().await.unwrap();
        assert_eq!(storage.load("auth-storage").await.unwrap(), None);
    }
}
