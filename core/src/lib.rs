//! CCV Consumer Core Library
//!
//! Core types, traits, and configuration shared by the consumer store crates.
//! The ordered key-value store is modelled as an injected capability
//! (`KvStore`) so the key space can be exercised against any backend.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;
pub mod logging;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
pub use logging::*;
