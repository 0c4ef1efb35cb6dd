//! Storage backend trait and error types

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("Corrupt data at {0}")]
    Corrupt(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Byte-oriented, path-addressed storage (Object Safe).
///
/// Paths are `/`-separated and relative to the backend root.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Check if backend is healthy
    async fn is_healthy(&self) -> bool;

    /// Replace the contents at `path`; durable once this returns
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Read the contents at `path`, `None` if absent
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Append to `path`, creating it if absent
    async fn append(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Delete `path`; returns whether anything was removed
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Check if `path` exists
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Paths of the files directly inside directory `dir`, sorted
    async fn list_dir(&self, dir: &str) -> Result<Vec<String>, StorageError>;
}

/// Extension trait for typed access
#[async_trait]
pub trait StorageExt {
    async fn put_json<T: Serialize + Send + Sync>(
        &self,
        path: &str,
        value: &T,
    ) -> Result<(), StorageError>;
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StorageError>;
    async fn read_text(&self, path: &str) -> Result<Option<String>, StorageError>;
}

#[async_trait]
impl<S: StorageBackend + ?Sized> StorageExt for S {
    async fn put_json<T: Serialize + Send + Sync>(
        &self,
        path: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.write(path, &bytes).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StorageError> {
        match self.read(path).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::Serialization(format!("{}: {}", path, e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn read_text(&self, path: &str) -> Result<Option<String>, StorageError> {
        match self.read(path).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StorageError::Corrupt(path.to_string())),
            None => Ok(None),
        }
    }
}

/// In-memory storage backend (for testing)
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: tokio::sync::RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.data.write().await.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().await.get(path).cloned())
    }

    async fn append(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.data
            .write()
            .await
            .entry(path.to_string())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.data.write().await.remove(path).is_some())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.data.read().await.contains_key(path))
    }

    async fn list_dir(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let data = self.data.read().await;
        Ok(data
            .keys()
            .filter(|k| {
                k.strip_prefix(&prefix)
                    .map(|rest| !rest.is_empty() && !rest.contains('/'))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
