//! Stable fingerprints for resolved matrices.
//!
//! A fingerprint is a truncated SHA-256 of the JSON serialization. Two runs
//! that resolve to the same builds, in the same order, share a fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::FINGERPRINT_LEN;

pub type HashError = serde_json::Error;

/// A 20-character lowercase hexadecimal hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let digest = Sha256::digest(serialized.as_bytes());
    let full = hex::encode(digest);
    Ok(ObjectHash(full[..FINGERPRINT_LEN].to_string()))
  }
}
