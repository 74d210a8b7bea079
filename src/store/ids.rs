//! Short opaque identifiers mapping to URLs and their attributes.
//!
//! Key layout (all under the shared [`KvStore`]):
//! - `{id}` → destination URL
//! - `{id}:apiKey`, `{id}:region` → context attributes
//! - `url:{target}` → id previously minted for `target`

use rand::Rng;
use std::sync::Arc;

use crate::analytics::Region;
use crate::observability::metrics;
use crate::store::{KvStore, StoreResult};

/// Number of symbols in a minted id.
pub const ID_LENGTH: usize = 8;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Attempts at finding an unused id before accepting a (vanishingly unlikely) overwrite.
const MINT_ATTEMPTS: usize = 3;

/// Mints and resolves mapping ids.
#[derive(Clone)]
pub struct IdentifierStore {
    store: Arc<dyn KvStore>,
}

/// Attributes recorded for a context when it was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAttributes {
    pub api_key: Option<String>,
    pub region: Region,
}

impl IdentifierStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Generate a random id. 64^8 possibilities.
    pub fn generate_id() -> String {
        let mut rng = rand::thread_rng();
        (0..ID_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Persist `value` under a fresh id and return the id.
    pub async fn create(&self, value: &str) -> StoreResult<String> {
        let mut id = Self::generate_id();
        for _ in 1..MINT_ATTEMPTS {
            if self.store.get(&id).await?.is_none() {
                break;
            }
            id = Self::generate_id();
        }
        self.store.put(&id, value).await?;
        metrics::record_mapping_created();
        Ok(id)
    }

    /// Value stored under `id`, or `None` if the id is unknown.
    pub async fn resolve(&self, id: &str) -> StoreResult<Option<String>> {
        self.store.get(id).await
    }

    /// Id for a destination URL, reusing an earlier mapping when one exists.
    pub async fn id_for_url(&self, url: &str) -> StoreResult<String> {
        let reverse_key = format!("url:{}", url);
        if let Some(id) = self.store.get(&reverse_key).await? {
            // The forward entry is checked too; a half-written pair is re-minted.
            if self.store.get(&id).await?.as_deref() == Some(url) {
                return Ok(id);
            }
        }
        let id = self.create(url).await?;
        self.store.put(&reverse_key, &id).await?;
        Ok(id)
    }

    /// Register an origin frame as a new context.
    pub async fn register_context(
        &self,
        url: &str,
        api_key: Option<&str>,
        region: Region,
    ) -> StoreResult<String> {
        let id = self.create(url).await?;
        if let Some(key) = api_key {
            self.store.put(&format!("{}:apiKey", id), key).await?;
        }
        self.store.put(&format!("{}:region", id), region.as_str()).await?;
        Ok(id)
    }

    /// Attributes of a context; missing attributes fall back to defaults.
    pub async fn context_attributes(&self, id: &str) -> StoreResult<ContextAttributes> {
        let api_key = self.store.get(&format!("{}:apiKey", id)).await?;
        let region = self
            .store
            .get(&format!("{}:region", id))
            .await?
            .map(|r| Region::from_stored(&r))
            .unwrap_or_default();
        Ok(ContextAttributes { api_key, region })
    }
}
