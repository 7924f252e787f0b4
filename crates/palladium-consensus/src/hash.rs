//! 256-bit hashes and double-SHA256.
//!
//! `H256` keeps Bitcoin's internal (little-endian) byte order; the
//! textual form is the familiar byte-reversed hex string.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 256-bit hash in internal byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct H256([u8; 32]);

impl H256 {
    /// The all-zero hash.
    pub const ZERO: H256 = H256([0; 32]);

    /// Wrap raw bytes already in internal order.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        H256(bytes)
    }

    /// Raw bytes in internal order.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// The hash interpreted as an unsigned 256-bit integer.
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0)
    }

    /// Build a hash from an integer no wider than 256 bits.
    pub fn from_biguint(value: &BigUint) -> Self {
        let bytes = value.to_bytes_le();
        let mut out = [0u8; 32];
        let take = bytes.len().min(32);
        out[..take].copy_from_slice(&bytes[..take]);
        H256(out)
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", self)
    }
}

/// Error parsing a hash from hex.
#[derive(Debug, Clone, Error)]
#[error("invalid hash hex: {0}")]
pub struct HashParseError(pub String);

impl FromStr for H256 {
    type Err = HashParseError;

    /// Parse big-endian hex, tolerating an optional `0x` prefix and
    /// shorter-than-64-digit strings (left-padded with zeros).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_str = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if hex_str.is_empty() || hex_str.len() > 64 {
            return Err(HashParseError(s.to_string()));
        }
        let padded = format!("{:0>64}", hex_str);
        let bytes = hex::decode(&padded).map_err(|_| HashParseError(s.to_string()))?;
        let mut out = [0u8; 32];
        for (i, byte) in bytes.iter().rev().enumerate() {
            out[i] = *byte;
        }
        Ok(H256(out))
    }
}

/// Double-SHA256 over arbitrary bytes.
pub fn double_sha256(data: &[u8]) -> H256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    H256(second.into())
}

/// Double-SHA256 over the concatenation of two hashes, the node
/// combiner of the Bitcoin merkle tree.
pub fn double_sha256_pair(left: &H256, right: &H256) -> H256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_bytes());
    buf[32..].copy_from_slice(right.as_bytes());
    double_sha256(&buf)
}
