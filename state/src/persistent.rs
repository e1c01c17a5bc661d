//! Persistent store using sled database

use async_trait::async_trait;
use ccv_core::{CcvResult, KvStore, StoreChange, StoreEntry};
use sled::{Db, IVec, Tree};
use std::path::Path;
use tracing::{debug, info, trace};

use crate::store::storage_err;

const STORE_TREE: &str = "ccvconsumer";

/// Persistent store backed by a single sled tree
pub struct PersistentStore {
    db: Db,
    tree: Tree,
}

impl PersistentStore {
    pub fn open<P: AsRef<Path>>(path: P) -> CcvResult<Self> {
        let db = sled::open(path.as_ref()).map_err(storage_err)?;
        let tree = db.open_tree(STORE_TREE).map_err(storage_err)?;

        info!(
            path = %path.as_ref().display(),
            entries = tree.len(),
            "Opened persistent store"
        );

        Ok(Self { db, tree })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> CcvResult<()> {
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }

    /// Number of entries in the store
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn collect<I>(iter: I) -> CcvResult<Vec<StoreEntry>>
    where
        I: Iterator<Item = sled::Result<(IVec, IVec)>>,
    {
        iter.map(|result| {
            result
                .map(|(key, value)| StoreEntry::new(key.to_vec(), value.to_vec()))
                .map_err(storage_err)
        })
        .collect()
    }
}

#[async_trait]
impl KvStore for PersistentStore {
    async fn get(&self, key: &[u8]) -> CcvResult<Option<Vec<u8>>> {
        self.tree
            .get(key)
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(storage_err)
    }

    async fn has(&self, key: &[u8]) -> CcvResult<bool> {
        self.tree.contains_key(key).map_err(storage_err)
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> CcvResult<()> {
        trace!(key = %hex::encode(key), len = value.len(), "sled set");
        self.tree.insert(key, value).map_err(storage_err)?;
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> CcvResult<()> {
        trace!(key = %hex::encode(key), "sled delete");
        self.tree.remove(key).map_err(storage_err)?;
        Ok(())
    }

    async fn iter_prefix(&self, prefix: &[u8]) -> CcvResult<Vec<StoreEntry>> {
        Self::collect(self.tree.scan_prefix(prefix))
    }

    async fn iter_range(&self, start: &[u8], end: &[u8]) -> CcvResult<Vec<StoreEntry>> {
        if start >= end {
            return Ok(Vec::new());
        }
        Self::collect(self.tree.range(start..end))
    }

    async fn apply_batch(&self, changes: Vec<StoreChange>) -> CcvResult<()> {
        let count = changes.len();
        let mut batch = sled::Batch::default();

        for change in changes {
            match change {
                StoreChange::Set { key, value } => batch.insert(key, value),
                StoreChange::Delete { key } => batch.remove(key),
            }
        }

        self.tree.apply_batch(batch).map_err(storage_err)?;
        self.flush()?;

        debug!(changes = count, "Applied store batch");
        Ok(())
    }
}
