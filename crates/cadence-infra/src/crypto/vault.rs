//! AES-256-GCM vault encryption for secrets at rest.
//!
//! VaultCrypto provides symmetric encryption using AES-256-GCM with random
//! nonces. The master key can come from:
//! - A raw 32-byte key
//! - A password (Argon2id key derivation)
//! - A key file next to the database (auto-generated, zero-friction default)
//!
//! Encrypted format: `nonce (12 bytes) || ciphertext`
//!
//! SECURITY: Error types never contain plaintext or key material.

use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use thiserror::Error;

/// Nonce size for AES-256-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// Errors from vault encryption operations.
///
/// IMPORTANT: These errors never include plaintext, key material, or
/// ciphertext in their Display/Debug output to prevent accidental logging
/// of secrets.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid ciphertext: too short")]
    CiphertextTooShort,

    #[error("key derivation failed")]
    KeyDerivationFailed,

    #[error("key file error: {0}")]
    KeyFile(String),
}

/// AES-256-GCM encryption for vault secrets at rest.
///
/// Each encryption call generates a random 12-byte nonce, prepended to the
/// ciphertext, so encrypting the same plaintext twice produces different
/// output.
pub struct VaultCrypto {
    cipher: Aes256Gcm,
}

impl VaultCrypto {
    /// Create a new VaultCrypto from a raw 32-byte key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Derive a 32-byte encryption key from a password using Argon2id.
    ///
    /// Uses OWASP recommended parameters (19 MiB memory, 2 iterations, 1
    /// parallelism degree). The salt is deterministic ("cadence-vault-v1")
    /// so the same password always produces the same key; the password
    /// itself provides the entropy, and the hash is used as a KDF for
    /// encryption rather than stored for verification.
    pub fn from_password(password: &str) -> Result<Self, VaultError> {
        use argon2::{Algorithm, Argon2, Params, Version};

        let params =
            Params::new(19456, 2, 1, Some(32)).map_err(|_| VaultError::KeyDerivationFailed)?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = b"cadence-vault-v1";
        let mut key = [0u8; 32];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut key)
            .map_err(|_| VaultError::KeyDerivationFailed)?;

        Ok(Self::new(&key))
    }

    /// Load or auto-generate a master key from a key file.
    ///
    /// This is the zero-friction default path for a headless daemon:
    /// 1. Read the hex-encoded key from `path` if it exists
    /// 2. Otherwise generate a random 32-byte key and write it (0600 on Unix)
    ///
    /// The key file holds 64 hex chars = 32 bytes.
    pub fn from_key_file(path: &Path) -> Result<Self, VaultError> {
        match std::fs::read_to_string(path) {
            Ok(hex_key) => {
                let key_bytes = hex_decode(hex_key.trim())
                    .map_err(|_| VaultError::KeyFile("corrupted key file".to_string()))?;
                if key_bytes.len() != 32 {
                    return Err(VaultError::KeyFile("invalid key length".to_string()));
                }
                let mut key = [0u8; 32];
                key.copy_from_slice(&key_bytes);
                Ok(Self::new(&key))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let key: [u8; 32] = rand_bytes();
                let hex_key = hex_encode(&key);
                std::fs::write(path, &hex_key)
                    .map_err(|e| VaultError::KeyFile(e.to_string()))?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                        .map_err(|e| VaultError::KeyFile(e.to_string()))?;
                }
                Ok(Self::new(&key))
            }
            Err(err) => Err(VaultError::KeyFile(err.to_string())),
        }
    }

    /// Encrypt plaintext using AES-256-GCM with a random nonce.
    ///
    /// Returns `nonce (12 bytes) || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VaultError::EncryptionFailed)?;

        // Prepend nonce to ciphertext
        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt data produced by `encrypt()`.
    ///
    /// Expects `nonce (12 bytes) || ciphertext` format.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, VaultError> {
        if data.len() < NONCE_SIZE {
            return Err(VaultError::CiphertextTooShort);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| VaultError::DecryptionFailed)
    }
}

/// Generate 32 random bytes using the OS CSPRNG.
fn rand_bytes() -> [u8; 32] {
    use aes_gcm::aead::rand_core::RngCore;
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

/// Hex-encode bytes to string.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex-decode a string to bytes.
pub(crate) fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("odd length hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        // Deterministic key for testing only
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let crypto = VaultCrypto::new(&test_key());
        let plaintext = b"hunter2, or a whole service-account JSON document";

        let encrypted = crypto.encrypt(plaintext).unwrap();
        let decrypted = crypto.decrypt(&encrypted).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let crypto1 = VaultCrypto::new(&test_key());
        let mut wrong_key = test_key();
        wrong_key[0] = 0xFF; // Flip one byte
        let crypto2 = VaultCrypto::new(&wrong_key);

        let encrypted = crypto1.encrypt(b"secret data").unwrap();
        let result = crypto2.decrypt(&encrypted);

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), VaultError::DecryptionFailed));
    }

    #[test]
    fn test_random_nonce_produces_different_ciphertexts() {
        let crypto = VaultCrypto::new(&test_key());
        let plaintext = b"same plaintext";

        let encrypted1 = crypto.encrypt(plaintext).unwrap();
        let encrypted2 = crypto.encrypt(plaintext).unwrap();

        assert_ne!(encrypted1, encrypted2);

        assert_eq!(crypto.decrypt(&encrypted1).unwrap(), plaintext);
        assert_eq!(crypto.decrypt(&encrypted2).unwrap(), plaintext);
    }

    #[test]
    fn test_ciphertext_too_short() {
        let crypto = VaultCrypto::new(&test_key());
        let result = crypto.decrypt(&[0u8; 5]); // Less than 12-byte nonce

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), VaultError::CiphertextTooShort));
    }

    #[test]
    fn test_empty_plaintext() {
        let crypto = VaultCrypto::new(&test_key());
        let encrypted = crypto.encrypt(b"").unwrap();
        let decrypted = crypto.decrypt(&encrypted).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_from_password() {
        let crypto1 = VaultCrypto::from_password("my-strong-password").unwrap();
        let crypto2 = VaultCrypto::from_password("my-strong-password").unwrap();

        // Same password should produce same key (deterministic salt)
        let plaintext = b"test data";
        let encrypted = crypto1.encrypt(plaintext).unwrap();
        let decrypted = crypto2.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_different_passwords_produce_different_keys() {
        let crypto1 = VaultCrypto::from_password("password-one").unwrap();
        let crypto2 = VaultCrypto::from_password("password-two").unwrap();

        let encrypted = crypto1.encrypt(b"secret").unwrap();
        let result = crypto2.decrypt(&encrypted);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_key_file_generates_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("vault.key");

        let crypto1 = VaultCrypto::from_key_file(&key_path).unwrap();
        assert!(key_path.exists());

        // Reloading uses the same key.
        let crypto2 = VaultCrypto::from_key_file(&key_path).unwrap();
        let encrypted = crypto1.encrypt(b"payload").unwrap();
        assert_eq!(crypto2.decrypt(&encrypted).unwrap(), b"payload");
    }

    #[test]
    fn test_from_key_file_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("vault.key");
        std::fs::write(&key_path, "not hex at all").unwrap();

        let result = VaultCrypto::from_key_file(&key_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_hex_roundtrip() {
        let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0xFF];
        let encoded = hex_encode(&bytes);
        assert_eq!(encoded, "deadbeef00ff");
        let decoded = hex_decode(&encoded).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_vault_error_never_contains_secrets() {
        // Error messages may contain technical terms but must never contain
        // actual secret values or key material.
        let test_secret = "pw-super-secret-value-12345";
        let test_key_hex = "deadbeefcafebabe";

        let errors = [
            VaultError::EncryptionFailed,
            VaultError::DecryptionFailed,
            VaultError::CiphertextTooShort,
            VaultError::KeyDerivationFailed,
            VaultError::KeyFile("permission denied".to_string()),
        ];

        for err in &errors {
            let msg = err.to_string();
            assert!(!msg.contains(test_secret), "Error leaks secret value: {msg}");
            assert!(!msg.contains(test_key_hex), "Error leaks key material: {msg}");
        }
    }
}
