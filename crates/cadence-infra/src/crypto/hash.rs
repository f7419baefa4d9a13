//! SHA-256 content hashing for script digests.
//!
//! Implements the `ContentHasher` trait from `cadence-core` using the
//! `sha2` crate (RustCrypto ecosystem). Each run record is stamped with the
//! digest of the script file it executed.

use sha2::{Digest, Sha256};

use cadence_core::service::hash::ContentHasher;

/// SHA-256 implementation of `ContentHasher`.
///
/// Computes lowercase hex-encoded SHA-256 digests.
pub struct Sha256ContentHasher;

impl Sha256ContentHasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }
}

impl Default for Sha256ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher for Sha256ContentHasher {
    fn compute_hash(&self, content: &[u8]) -> String {
        let digest = Sha256::digest(content);
        format!("{:x}", digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let hasher = Sha256ContentHasher::new();
        assert_eq!(
            hasher.compute_hash(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_empty_content() {
        let hasher = Sha256ContentHasher::new();
        assert_eq!(
            hasher.compute_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_is_hex_64() {
        let hasher = Sha256ContentHasher::new();
        let digest = hasher.compute_hash(b"import os\nprint(os.environ)\n");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
