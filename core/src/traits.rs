//! Core traits defining the store capability
//!
//! The consumer never depends on a concrete backend. Anything that offers an
//! ordered byte-keyed map with prefix and range iteration can back it.

use crate::types::StoreEntry;
use async_trait::async_trait;

/// Result type for CCV consumer operations
pub type CcvResult<T> = Result<T, crate::error::CcvError>;

/// Store change operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl StoreChange {
    pub fn key(&self) -> &[u8] {
        match self {
            StoreChange::Set { key, .. } | StoreChange::Delete { key } => key,
        }
    }
}

/// Ordered key-value store.
///
/// Keys compare byte-lexicographically. Scans return entries in ascending key
/// order.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &[u8]) -> CcvResult<Option<Vec<u8>>>;

    /// Check if a key exists
    async fn has(&self, key: &[u8]) -> CcvResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Set a value
    async fn set(&self, key: &[u8], value: &[u8]) -> CcvResult<()>;

    /// Delete a key
    async fn delete(&self, key: &[u8]) -> CcvResult<()>;

    /// All entries whose key starts with `prefix`
    async fn iter_prefix(&self, prefix: &[u8]) -> CcvResult<Vec<StoreEntry>>;

    /// All entries with `start <= key < end`
    async fn iter_range(&self, start: &[u8], end: &[u8]) -> CcvResult<Vec<StoreEntry>>;

    /// Apply a batch of changes atomically
    async fn apply_batch(&self, changes: Vec<StoreChange>) -> CcvResult<()>;
}
