//! Consumer module configuration

use ccv_core::{load_json, CcvError, CcvResult, LoggingConfig, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::keys::{HISTORICAL_ENTRIES, MODULE_NAME, PORT_ID};

/// Consumer module configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Module name, also used as the store key
    pub module_name: String,

    /// Port id the module binds to
    pub port_id: String,

    /// Number of historical info entries to keep
    pub historical_entries: u32,

    /// Store backend
    pub store: StoreConfig,

    /// Logging
    pub logging: LoggingConfig,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            module_name: MODULE_NAME.to_string(),
            port_id: PORT_ID.to_string(),
            historical_entries: HISTORICAL_ENTRIES,
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ConsumerConfig {
    pub fn from_json(json: &str) -> CcvResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CcvError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> CcvResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> CcvResult<Self> {
        let config: Self = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CcvResult<()> {
        if self.module_name.is_empty() {
            return Err(CcvError::ConfigError("module_name must not be empty".to_string()));
        }
        if self.port_id.is_empty() {
            return Err(CcvError::ConfigError("port_id must not be empty".to_string()));
        }
        if self.historical_entries == 0 {
            return Err(CcvError::ConfigError(
                "historical_entries must be positive".to_string(),
            ));
        }
        self.store.validate()
    }
}
