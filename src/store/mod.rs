//! Key-value storage subsystem.
//!
//! # Data Flow
//! ```text
//! Identifier Store (ids.rs)      Button Tracker (session/)     Identity cache
//!        │                               │                          │
//!        └───────────────┬───────────────┴──────────────────────────┘
//!                        ▼
//!                 KvStore (get / put / delete)
//!                        ▼
//!               memory.rs (DashMap + JSON snapshot)
//! ```
//!
//! # Design Decisions
//! - Every piece of cross-request state goes through `KvStore`; nothing is
//!   kept in process-local maps by the components themselves
//! - Callers tolerate stale reads: a write from another request may not be
//!   visible yet

pub mod ids;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use ids::IdentifierStore;
pub use memory::MemoryStore;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("corrupt value under '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The storage contract shared by every component.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;
    async fn delete(&self, key: &str) -> StoreResult<()>;
}
