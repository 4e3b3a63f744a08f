use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use study_core::model::CheckpointKey;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a checkpoint.
///
/// The payload is opaque JSON; typed encoding lives in the services layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRecord {
    pub key: CheckpointKey,
    pub payload: String,
    pub saved_at: DateTime<Utc>,
}

impl CheckpointRecord {
    #[must_use]
    pub fn new(key: CheckpointKey, payload: impl Into<String>, saved_at: DateTime<Utc>) -> Self {
        Self {
            key,
            payload: payload.into(),
            saved_at,
        }
    }
}

/// Keyed store of in-progress session checkpoints, at most one per key.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Fetch the checkpoint stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load(&self, key: CheckpointKey) -> Result<Option<CheckpointRecord>, StorageError>;

    /// Insert or replace the checkpoint stored under `record.key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save(&self, record: &CheckpointRecord) -> Result<(), StorageError>;

    /// Remove the checkpoint stored under `key`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear(&self, key: CheckpointKey) -> Result<bool, StorageError>;

    /// Keys of every stored checkpoint, most recently saved first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_keys(&self) -> Result<Vec<CheckpointKey>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    checkpoints: Arc<Mutex<HashMap<CheckpointKey, CheckpointRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryRepository {
    async fn load(&self, key: CheckpointKey) -> Result<Option<CheckpointRecord>, StorageError> {
        let guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn save(&self, record: &CheckpointRecord) -> Result<(), StorageError> {
        let mut guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.key, record.clone());
        Ok(())
    }

    async fn clear(&self, key: CheckpointKey) -> Result<bool, StorageError> {
        let mut guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.remove(&key).is_some())
    }

    async fn list_keys(&self) -> Result<Vec<CheckpointKey>, StorageError> {
        let guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<_> = guard.values().collect();
        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then(a.key.cmp(&b.key)));
        Ok(records.into_iter().map(|r| r.key).collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub checkpoints: Arc<dyn CheckpointRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let checkpoints: Arc<dyn CheckpointRepository> = Arc::new(InMemoryRepository::new());
        Self { checkpoints }
    }
}
