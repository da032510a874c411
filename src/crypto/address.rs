//! Account addresses
//!
//! Owners, recipients and call targets are 20-byte addresses rendered as
//! `0x`-prefixed lowercase hex. Parsing accepts either case and an
//! optional `0x` prefix.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while parsing an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address length: expected 40 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),
}

const ADDRESS_LEN: usize = 20;

/// A 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Address length in bytes
    pub const LEN: usize = ADDRESS_LEN;

    /// The null address. Never a valid owner.
    pub const ZERO: Address = Address([0u8; Address::LEN]);

    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; Address::LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random address
    pub fn random() -> Self {
        let mut bytes = [0u8; Address::LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Take the first 20 bytes of a digest as an address
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; Address::LEN];
        let n = digest.len().min(Address::LEN);
        bytes[..n].copy_from_slice(&digest[..n]);
        Self(bytes)
    }

    /// Parse a hex-encoded address (with or without `0x`)
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != Address::LEN * 2 {
            return Err(AddressError::InvalidLength(digits.len()));
        }

        let mut bytes = [0u8; Address::LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Lowercase `0x`-prefixed hex form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Whether this is the null address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; Address::LEN]
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; Address::LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
