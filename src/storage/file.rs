// File-backed storage backend
// A single JSON object per profile, rewritten on every change

use super::{KeyValueStore, StorageError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Persistent key-value store kept in one JSON file
///
/// The file maps each key to the JSON text of its value. It is loaded once at
/// open and rewritten (temp file + rename) after each `set_raw` or `remove`.
/// Deleting the file clears the profile.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                StorageError::Read(format!("Failed to read '{}': {}", path.display(), e))
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| {
                    StorageError::Unavailable(format!(
                        "Failed to parse '{}': {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            BTreeMap::new()
        };

        info!(
            "Opened analytics store at {} with {} key(s)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Write(format!("{}: {}", parent.display(), e)))?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {}", self.path.display(), e)))?;

        debug!("Persisted {} key(s) to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        let previous = entries.insert(key.to_string(), value);

        if let Err(e) = self.persist(&entries).await {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries).await {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries.keys().cloned().collect())
    }
}
