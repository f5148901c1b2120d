// Persistence backend abstraction
// Provides a pluggable key-value store scoped to a single browser profile

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::StorageConfig;

/// Key-value persistence backend
///
/// Values are JSON text, the same shape a browser local-storage service keeps.
/// Every call is individually consistent, but no sequence of calls is atomic:
/// read-modify-write callers can lose updates when they interleave.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw JSON text stored under `key`
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    async fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove `key` (no-op when absent)
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// List every stored key
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Storage read failed: {0}")]
    Read(String),
    #[error("Storage write failed: {0}")]
    Write(String),
    #[error("Malformed value for key '{key}': {reason}")]
    Malformed { key: String, reason: String },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Read and deserialize the value stored under `key`
pub async fn get_item<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get_raw(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Serialize `value` and store it under `key`
pub async fn set_item<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Write(e.to_string()))?;
    store.set_raw(key, raw).await
}

/// Build the storage backend named by the configuration
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageConfig::File { path } => Ok(Arc::new(FileStore::open(path)?)),
    }
}
