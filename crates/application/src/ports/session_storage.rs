//! Durable session storage port

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The key cannot be used as a storage entry name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Key-value storage scoped to one application namespace.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    /// `None` if nothing is stored under the key.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    async fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Removes every key in the namespace.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be wiped.
    async fn clear(&self) -> Result<(), StorageError>;
}
