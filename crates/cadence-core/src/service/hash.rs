//! ContentHasher trait for computing integrity digests.
//!
//! Defined in cadence-core so the runner can stamp each run with the digest
//! of the script it executed without coupling to a specific hashing
//! algorithm. The `Sha256ContentHasher` adapter lives in cadence-infra.

/// Abstraction over content hashing.
pub trait ContentHasher: Send + Sync {
    /// Compute a hex-encoded hash of the given content.
    fn compute_hash(&self, content: &[u8]) -> String;
}
