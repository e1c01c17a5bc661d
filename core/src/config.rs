//! Configuration types shared by the store crates

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CcvError;
use crate::traits::CcvResult;

/// Which store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-memory ordered map, lost on drop
    #[default]
    Memory,
    /// sled database under `data_dir`
    Persistent,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend selection
    pub backend: StoreBackend,

    /// Data directory (persistent backend only)
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            data_dir: PathBuf::from("./data/ccvconsumer"),
        }
    }
}

impl StoreConfig {
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Persistent,
            data_dir: data_dir.into(),
        }
    }

    pub fn validate(&self) -> CcvResult<()> {
        if self.backend == StoreBackend::Persistent && self.data_dir.as_os_str().is_empty() {
            return Err(CcvError::ConfigError(
                "persistent store requires a data_dir".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `ccv_consumer=debug`
    pub level: String,

    /// Include the event target in output
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

/// Read a JSON config file into any deserializable config type
pub fn load_json<T, P>(path: P) -> CcvResult<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        CcvError::ConfigError(format!("reading {}: {}", path.as_ref().display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| CcvError::ConfigError(e.to_string()))
}
