//! Secret management service.
//!
//! SecretService resolves secrets through a chain of providers in priority
//! order. Resolution precedence: env vars > per-job keys > global vault.
//!
//! This service lives in `cadence-core` and depends only on `cadence-types`
//! and the `DynSecretProvider` abstraction -- never on concrete infra
//! implementations.

use crate::repository::secret::DynSecretProvider;
use cadence_types::error::RepositoryError;
use cadence_types::secret::{SecretEntry, SecretScope};

/// Service for managing secrets across multiple storage backends.
///
/// Providers are ordered by precedence (first match wins).
/// Default chain: `[EnvSecretProvider, KeychainProvider, VaultSecretProvider]`
///
/// For job-scoped secrets, the service first tries providers with the job
/// scope, then falls back to global scope.
pub struct SecretService {
    providers: Vec<DynSecretProvider>,
}

impl SecretService {
    /// Create a new SecretService with the given provider chain.
    ///
    /// Providers should be ordered by precedence (highest priority first).
    pub fn new(providers: Vec<DynSecretProvider>) -> Self {
        Self { providers }
    }

    /// Resolve a secret value by iterating through providers in priority order.
    ///
    /// For `SecretScope::Job`: first tries providers with the job scope, then
    /// falls back to global scope. This implements the precedence:
    /// env vars > per-job keys > global vault.
    pub async fn get_secret(
        &self,
        key: &str,
        scope: &SecretScope,
    ) -> Result<Option<String>, RepositoryError> {
        if let SecretScope::Job(_) = scope {
            // Try job-scoped first across all providers
            for provider in &self.providers {
                if let Some(value) = provider.get_boxed(key, scope).await? {
                    return Ok(Some(value));
                }
            }

            // Fall back to global scope
            for provider in &self.providers {
                if let Some(value) = provider.get_boxed(key, &SecretScope::Global).await? {
                    return Ok(Some(value));
                }
            }

            Ok(None)
        } else {
            // Global scope: iterate providers, first match wins
            for provider in &self.providers {
                if let Some(value) = provider.get_boxed(key, scope).await? {
                    return Ok(Some(value));
                }
            }
            Ok(None)
        }
    }

    /// Store a secret value in the first writable provider.
    ///
    /// Iterates providers in order and writes to the first one that accepts
    /// the write. Read-only providers (e.g., env vars) return an error, which
    /// is silently skipped.
    pub async fn set_secret(
        &self,
        key: &str,
        value: &str,
        scope: &SecretScope,
    ) -> Result<(), RepositoryError> {
        for provider in &self.providers {
            match provider.set_boxed(key, value, scope).await {
                Ok(()) => return Ok(()),
                Err(_) => continue, // Skip read-only providers
            }
        }

        Err(RepositoryError::Query(
            "no writable secret provider available".to_string(),
        ))
    }

    /// Delete a secret from all providers that have it.
    ///
    /// Errors from individual providers are ignored (they may not have the key).
    pub async fn delete_secret(
        &self,
        key: &str,
        scope: &SecretScope,
    ) -> Result<(), RepositoryError> {
        let mut deleted = false;

        for provider in &self.providers {
            match provider.delete_boxed(key, scope).await {
                Ok(()) => deleted = true,
                Err(RepositoryError::NotFound) => continue,
                Err(_) => continue, // Provider unavailable
            }
        }

        if !deleted {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// List all secrets, aggregated from all providers and deduplicated.
    ///
    /// First provider wins for duplicate keys (preserves precedence).
    pub async fn list_secrets(
        &self,
        scope: &SecretScope,
    ) -> Result<Vec<SecretEntry>, RepositoryError> {
        let mut seen_keys = std::collections::HashSet::new();
        let mut entries = Vec::new();

        for provider in &self.providers {
            match provider.list_boxed(scope).await {
                Ok(provider_entries) => {
                    for entry in provider_entries {
                        if seen_keys.insert(entry.key.clone()) {
                            entries.push(entry);
                        }
                    }
                }
                Err(_) => continue, // Provider unavailable
            }
        }

        Ok(entries)
    }

    /// Mask a secret value, showing only the last 4 characters.
    pub fn mask_secret(value: &str) -> String {
        if value.len() <= 4 {
            "****".to_string()
        } else {
            format!("****{}", &value[value.len() - 4..])
        }
    }
}
