//! Startup and teardown of the shared store.
//!
//! The store is opened once per process, before the first pipeline is
//! built, and snapshotted after the server has drained.

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::store::MemoryStore;

/// Open the store, seeding it from the configured snapshot.
/// An unreadable snapshot is logged and the store starts empty.
pub fn open_store(config: &StoreConfig) -> Arc<MemoryStore> {
    let Some(path) = &config.persistence_path else {
        return Arc::new(MemoryStore::new(None));
    };
    match MemoryStore::load_from_file(path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Failed to load store snapshot, starting empty");
            Arc::new(MemoryStore::new(Some(path.clone())))
        }
    }
}

/// Write the snapshot, if persistence is configured.
pub fn persist_store(store: &MemoryStore) {
    if let Err(e) = store.save_to_file() {
        tracing::error!(error = %e, "Failed to save store snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KvStore;

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json").to_string_lossy().into_owned();
        let config = StoreConfig {
            persistence_path: Some(path.clone()),
        };

        let store = open_store(&config);
        assert!(store.is_empty());
        store.put("abc123", "https://example.com/frame").await.unwrap();
        persist_store(&store);

        let reopened = open_store(&config);
        assert_eq!(
            reopened.get("abc123").await.unwrap().as_deref(),
            Some("https://example.com/frame")
        );
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{broken").unwrap();

        let store = open_store(&StoreConfig {
            persistence_path: Some(path.to_string_lossy().into_owned()),
        });
        assert!(store.is_empty());
    }
}
