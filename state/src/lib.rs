//! CCV Consumer State Storage
//!
//! Ordered key-value backends implementing `ccv_core::KvStore`: an in-memory
//! map used by tests and light setups, and a sled-backed persistent store.

pub mod store;
pub mod memory;
pub mod persistent;

pub use store::*;
pub use memory::*;
pub use persistent::*;
