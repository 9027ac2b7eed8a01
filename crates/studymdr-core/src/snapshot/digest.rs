//! Content digest of SoA snapshots
//!
//! SHA-256 over the canonical JSON of both reference lists. Equal
//! snapshots always hash equal; any change in coordinates, names or
//! footnotes changes the digest.

use sha2::{Digest, Sha256};

use crate::errors::Result;

use super::references::SoASnapshot;

/// Hex-encoded SHA-256 of the snapshot (64 characters)
///
/// # Errors
/// `Serialization` if JSON encoding fails.
pub fn compute_snapshot_digest(snapshot: &SoASnapshot) -> Result<String> {
    let canonical = serde_json::to_string(snapshot)?;
    Ok(hash_string(&canonical))
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
