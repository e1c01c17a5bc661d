//! CCV Consumer Module Store Layer
//!
//! Implements the consumer chain's store layout:
//! - Key space: one reserved tag byte per logical field
//! - Order-preserving big-endian encoding of heights and packet ids
//! - Length-prefixed validator addresses for downtime records
//! - Typed accessors over any ordered key-value backend

pub mod keys;
pub mod config;
pub mod store;

pub use keys::*;
pub use config::*;
pub use store::*;
