use crate::{Block, ChainError};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::fmt;
use std::str::FromStr;

/// Digest strategy for block hashing and proof checks. Picked once at
/// construction; every node in a network must agree on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Keccak256,
}

impl HashAlgorithm {
    /// Lowercase hex digest of `bytes`.
    pub fn digest_hex(&self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Keccak256 => hex::encode(Keccak256::digest(bytes)),
        }
    }

    /// Hash of a block's canonical form: JSON with keys sorted, so the digest
    /// depends only on field values, never on insertion order.
    pub fn hash_block(&self, block: &Block) -> Result<String, ChainError> {
        // Round-tripping through Value sorts the keys (serde_json's map is
        // BTreeMap-backed).
        let canonical = serde_json::to_string(&serde_json::to_value(block)?)?;
        Ok(self.digest_hex(canonical.as_bytes()))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Keccak256 => "keccak256",
        })
    }
}

impl FromStr for HashAlgorithm {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "keccak256" => Ok(HashAlgorithm::Keccak256),
            other => Err(ChainError::UnknownAlgorithm(other.to_string())),
        }
    }
}
