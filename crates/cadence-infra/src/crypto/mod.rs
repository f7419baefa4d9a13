//! Cryptographic operations: AES-256-GCM vault encryption and SHA-256
//! content hashing.

pub mod hash;
pub mod vault;
