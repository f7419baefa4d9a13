//! Secret provider implementations.
//!
//! - `env`: Environment variable provider (read-only, highest priority)
//! - `chain`: Secret chain builder wiring all providers together
//! - `VaultSecretProvider`: Encrypts/decrypts secrets using AES-256-GCM vault + SQLite storage

pub mod chain;
pub mod env;

use cadence_core::repository::secret::SecretProvider;
use cadence_types::error::RepositoryError;
use cadence_types::secret::{SecretEntry, SecretScope};

use crate::crypto::vault::{hex_decode, hex_encode, VaultCrypto};
use crate::sqlite::secret::SqliteSecretRepository;

/// Secret provider that encrypts values with AES-256-GCM before storing in
/// SQLite.
///
/// This combines:
/// - `VaultCrypto` for AES-256-GCM encryption/decryption
/// - `SqliteSecretRepository` for persistent storage
///
/// Values are encrypted before storage and decrypted on retrieval. The
/// SQLite layer stores hex-encoded encrypted bytes.
pub struct VaultSecretProvider {
    repo: SqliteSecretRepository,
    crypto: VaultCrypto,
}

impl VaultSecretProvider {
    /// Create a new vault provider from a SQLite repository and VaultCrypto
    /// instance.
    pub fn new(repo: SqliteSecretRepository, crypto: VaultCrypto) -> Self {
        Self { repo, crypto }
    }
}

impl SecretProvider for VaultSecretProvider {
    async fn get(
        &self,
        key: &str,
        scope: &SecretScope,
    ) -> Result<Option<String>, RepositoryError> {
        let hex_encrypted = match self.repo.get(key, scope).await? {
            Some(hex) => hex,
            None => return Ok(None),
        };

        let encrypted_bytes = hex_decode(&hex_encrypted)
            .map_err(|e| RepositoryError::Query(format!("corrupt vault data: {e}")))?;

        let plaintext = self
            .crypto
            .decrypt(&encrypted_bytes)
            .map_err(|_| RepositoryError::Query("decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|_| RepositoryError::Query("decrypted value is not valid UTF-8".to_string()))
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        scope: &SecretScope,
    ) -> Result<(), RepositoryError> {
        let encrypted_bytes = self
            .crypto
            .encrypt(value.as_bytes())
            .map_err(|_| RepositoryError::Query("encryption failed".to_string()))?;

        let hex_encrypted = hex_encode(&encrypted_bytes);

        self.repo.set(key, &hex_encrypted, scope).await
    }

    async fn delete(&self, key: &str, scope: &SecretScope) -> Result<(), RepositoryError> {
        self.repo.delete(key, scope).await
    }

    async fn list(&self, scope: &SecretScope) -> Result<Vec<SecretEntry>, RepositoryError> {
        self.repo.list(scope).await
    }
}
