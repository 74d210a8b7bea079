//! In-process store with optional JSON snapshot persistence.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use crate::store::{KvStore, StoreResult};

/// A concurrent map implementing [`KvStore`].
///
/// Shared by all requests and all pipeline generations of one process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
    persistence_path: Option<String>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Open a store, seeding it from the snapshot at `path` if one exists.
    pub fn load_from_file(path: &str) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let entries: HashMap<String, String> = serde_json::from_reader(reader)?;
            for (k, v) in entries {
                store.inner.insert(k, v);
            }
            tracing::info!(entries = store.inner.len(), path = %path, "Loaded store snapshot");
        }
        Ok(store)
    }

    /// Write a snapshot if a persistence path is configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let entries: HashMap<_, _> = self
                .inner
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();
            serde_json::to_writer(BufWriter::new(File::create(path)?), &entries)?;
            tracing::info!(entries = entries.len(), path = %path, "Saved store snapshot");
        }
        Ok(())
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key);
        Ok(())
    }
}
