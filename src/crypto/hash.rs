//! Hashing utilities for the wallet
//!
//! SHA-256 digests are used for transaction digests and for deriving
//! the wallet's own address from its initial owner configuration.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Computes SHA-256 over several length-prefixed parts.
///
/// Each part is prefixed with its length as a big-endian `u64`, so
/// `["ab", "c"]` and `["a", "bc"]` never collide.
pub fn sha256_parts(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}
