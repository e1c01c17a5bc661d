//! In-memory ordered store for testing and light setups

use async_trait::async_trait;
use ccv_core::{CcvResult, KvStore, StoreChange, StoreEntry};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::trace;

use crate::store::prefix_end;

/// In-memory store over a `BTreeMap`, so scans come back in key order
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_data(data: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            data: RwLock::new(data.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn collect(&self, lower: Bound<Vec<u8>>, upper: Bound<Vec<u8>>) -> Vec<StoreEntry> {
        self.data
            .read()
            .range((lower, upper))
            .map(|(k, v)| StoreEntry::new(k.clone(), v.clone()))
            .collect()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            data: RwLock::new(self.data.read().clone()),
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> CcvResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn has(&self, key: &[u8]) -> CcvResult<bool> {
        Ok(self.data.read().contains_key(key))
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> CcvResult<()> {
        trace!(key = %hex::encode(key), len = value.len(), "memory set");
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> CcvResult<()> {
        trace!(key = %hex::encode(key), "memory delete");
        self.data.write().remove(key);
        Ok(())
    }

    async fn iter_prefix(&self, prefix: &[u8]) -> CcvResult<Vec<StoreEntry>> {
        let upper = match prefix_end(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        Ok(self.collect(Bound::Included(prefix.to_vec()), upper))
    }

    async fn iter_range(&self, start: &[u8], end: &[u8]) -> CcvResult<Vec<StoreEntry>> {
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(self.collect(
            Bound::Included(start.to_vec()),
            Bound::Excluded(end.to_vec()),
        ))
    }

    async fn apply_batch(&self, changes: Vec<StoreChange>) -> CcvResult<()> {
        let mut data = self.data.write();
        for change in changes {
            match change {
                StoreChange::Set { key, value } => {
                    data.insert(key, value);
                }
                StoreChange::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();

        // Set and get
        store.set(b"key1", b"value1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));

        // Delete
        store.delete(b"key1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_memory_store_batch() {
        let store = MemoryStore::new();
        store.set(b"k0", b"v0").await.unwrap();

        let changes = vec![
            StoreChange::Set {
                key: b"k1".to_vec(),
                value: b"v1".to_vec(),
            },
            StoreChange::Set {
                key: b"k2".to_vec(),
                value: b"v2".to_vec(),
            },
            StoreChange::Delete {
                key: b"k0".to_vec(),
            },
        ];
        store.apply_batch(changes).await.unwrap();

        assert!(!store.has(b"k0").await.unwrap());
        assert!(store.has(b"k1").await.unwrap());
        assert!(store.has(b"k2").await.unwrap());
    }

    #[tokio::test]
    async fn test_prefix_scan_is_ordered_and_bounded() {
        let store = MemoryStore::with_data(vec![
            (vec![0x06, 0x02], b"b".to_vec()),
            (vec![0x07, 0x00], b"x".to_vec()),
            (vec![0x06, 0x01], b"a".to_vec()),
            (vec![0x05], b"y".to_vec()),
        ]);

        let entries = store.iter_prefix(&[0x06]).await.unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.clone()).collect();
        assert_eq!(keys, vec![vec![0x06, 0x01], vec![0x06, 0x02]]);
    }

    #[tokio::test]
    async fn test_prefix_scan_all_ff() {
        let store = MemoryStore::with_data(vec![
            (vec![0xff], b"a".to_vec()),
            (vec![0xff, 0xff, 0x01], b"b".to_vec()),
            (vec![0xfe], b"c".to_vec()),
        ]);
        let entries = store.iter_prefix(&[0xff]).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_range_scan() {
        let store = MemoryStore::new();
        for i in 0u8..10 {
            store.set(&[1, i], &[i]).await.unwrap();
        }

        let entries = store.iter_range(&[1, 3], &[1, 6]).await.unwrap();
        let values: Vec<u8> = entries.iter().map(|e| e.value[0]).collect();
        assert_eq!(values, vec![3, 4, 5]);

        assert!(store.iter_range(&[1, 6], &[1, 3]).await.unwrap().is_empty());
    }
}
