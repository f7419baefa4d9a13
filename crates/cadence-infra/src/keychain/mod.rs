//! OS keychain adapter for secret storage.
//!
//! Uses the `keyring` crate to store/retrieve secrets via:
//! - macOS Keychain
//! - Linux Secret Service (GNOME Keyring, KDE Wallet)
//! - Windows Credential Manager
//!
//! Note: The keyring API does not support enumeration, so `list()` always
//! returns an empty vec. The vault (SQLite) maintains the key index.

use cadence_core::repository::secret::SecretProvider;
use cadence_types::error::RepositoryError;
use cadence_types::secret::{SecretEntry, SecretScope};

/// OS keychain secret provider using the `keyring` crate.
///
/// Stores secrets under a service name with optional job-scoped prefixes.
/// - Global scope: key is used as-is (e.g., "KURLY_PASSWORD")
/// - Job scope: key is prefixed with "job/{name}/" (e.g., "job/commute-end/KURLY_PASSWORD")
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a new KeychainProvider with the default service name "cadence".
    pub fn new() -> Self {
        Self {
            service_name: "cadence".to_string(),
        }
    }

    /// Create a KeychainProvider with a custom service name (useful for testing).
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Build the keychain entry key based on scope.
    fn scoped_key(&self, key: &str, scope: &SecretScope) -> String {
        match scope {
            SecretScope::Global => key.to_string(),
            SecretScope::Job(name) => format!("job/{name}/{key}"),
        }
    }

    /// Create a keyring::Entry for the given key and scope.
    fn entry(&self, key: &str, scope: &SecretScope) -> Result<keyring::Entry, RepositoryError> {
        let scoped = self.scoped_key(key, scope);
        keyring::Entry::new(&self.service_name, &scoped)
            .map_err(|e| RepositoryError::Query(format!("keychain entry error: {e}")))
    }
}

impl Default for KeychainProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretProvider for KeychainProvider {
    async fn get(
        &self,
        key: &str,
        scope: &SecretScope,
    ) -> Result<Option<String>, RepositoryError> {
        let entry = self.entry(key, scope)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(RepositoryError::Query(format!("keychain error: {e}"))),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        scope: &SecretScope,
    ) -> Result<(), RepositoryError> {
        let entry = self.entry(key, scope)?;
        entry
            .set_password(value)
            .map_err(|e| RepositoryError::Query(format!("keychain error: {e}")))
    }

    async fn delete(&self, key: &str, scope: &SecretScope) -> Result<(), RepositoryError> {
        let entry = self.entry(key, scope)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Err(RepositoryError::NotFound),
            Err(e) => Err(RepositoryError::Query(format!("keychain error: {e}"))),
        }
    }

    async fn list(&self, _scope: &SecretScope) -> Result<Vec<SecretEntry>, RepositoryError> {
        // The keyring API cannot enumerate entries.
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_key_global() {
        let provider = KeychainProvider::new();
        assert_eq!(
            provider.scoped_key("KURLY_PASSWORD", &SecretScope::Global),
            "KURLY_PASSWORD"
        );
    }

    #[test]
    fn test_scoped_key_job() {
        let provider = KeychainProvider::new();
        assert_eq!(
            provider.scoped_key(
                "KURLY_PASSWORD",
                &SecretScope::Job("commute-end".to_string())
            ),
            "job/commute-end/KURLY_PASSWORD"
        );
    }

    #[test]
    fn test_custom_service_name() {
        let provider = KeychainProvider::with_service("cadence-test");
        assert_eq!(provider.service_name, "cadence-test");
    }
}
