//! Content-addressed identity: source-id hashing and version-id minting.
//!
//! Both functions are pure and carry no storage dependency, matching the
//! reference crate's treatment of identity as a leaf concern.

use sha2::{Digest, Sha256};

pub const SOURCE_PREFIX: &str = "sha256:";

/// `sourceID(bytes) -> "sha256:" + lowercase hex digest`.
pub fn source_id(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{SOURCE_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// `versionID(id, version) -> id + ":v" + decimal(version)`.
pub fn version_id(id: &str, version: u64) -> String {
    format!("{id}:v{version}")
}

/// A node whose id begins with `sha256:` followed by 64 lowercase hex chars
/// is a Source node (§3, "Source nodes").
pub fn is_source_id(id: &str) -> bool {
    match id.strip_prefix(SOURCE_PREFIX) {
        Some(rest) => rest.len() == 64 && rest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
        None => false,
    }
}
