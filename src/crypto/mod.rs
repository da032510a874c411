//! Cryptographic utilities for the wallet
//!
//! This module provides:
//! - SHA-256 hashing
//! - 20-byte account addresses

pub mod address;
pub mod hash;

pub use address::{Address, AddressError};
pub use hash::{sha256, sha256_hex, sha256_parts};
