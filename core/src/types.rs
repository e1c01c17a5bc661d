//! Core types for the CCV consumer store

use serde::{Deserialize, Serialize};
use std::fmt;

/// Validator consensus address.
///
/// Raw bytes of variable length; the consumer never interprets them beyond
/// using them as a store index.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ConsAddress(pub Vec<u8>);

impl ConsAddress {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        ConsAddress(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Ok(ConsAddress(hex::decode(s)?))
    }
}

impl AsRef<[u8]> for ConsAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for ConsAddress {
    fn from(bytes: &[u8]) -> Self {
        ConsAddress(bytes.to_vec())
    }
}

impl From<Vec<u8>> for ConsAddress {
    fn from(bytes: Vec<u8>) -> Self {
        ConsAddress(bytes)
    }
}

impl fmt::Display for ConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for ConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsAddress(0x{})", self.to_hex())
    }
}

/// Key/value pair returned by store scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl StoreEntry {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}
