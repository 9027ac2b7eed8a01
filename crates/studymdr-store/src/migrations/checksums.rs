//! SHA-256 checksums of migration SQL
//!
//! A recorded checksum that no longer matches the embedded SQL means the
//! migration file was edited after it was applied.

use sha2::{Digest, Sha256};

pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
