//! Backend selection and prefix-range helpers

use ccv_core::{CcvError, CcvResult, KvStore, StoreBackend, StoreConfig};
use std::sync::Arc;
use tracing::info;

use crate::memory::MemoryStore;
use crate::persistent::PersistentStore;

/// Shared handle to any store backend
pub type SharedKvStore = Arc<dyn KvStore>;

/// Exclusive upper bound of the key range covered by `prefix`.
///
/// Returns `None` when every byte of the prefix is `0xff` (or it is empty),
/// in which case the range is unbounded above.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Open the backend described by `config`
pub fn open_store(config: &StoreConfig) -> CcvResult<SharedKvStore> {
    config.validate()?;
    match config.backend {
        StoreBackend::Memory => {
            info!("Opening in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Persistent => {
            let store = PersistentStore::open(&config.data_dir)?;
            Ok(Arc::new(store))
        }
    }
}

pub(crate) fn storage_err(err: sled::Error) -> CcvError {
    CcvError::StorageError(err.to_string())
}
