//! SHA-256 content fingerprints.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

/// Hex-encoded SHA-256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Hex-encoded SHA-256 of the file at `path`.
pub fn hash_file(path: &Path) -> Result<String, SyncError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(hash_bytes(&bytes))
}
