//! Secret provider trait definition.
//!
//! `SecretProvider` uses RPITIT async methods, so it is not object-safe.
//! `SecretProviderDyn` is the boxed-future mirror with a blanket
//! implementation, enabling the provider chain to hold heterogeneous
//! backends behind `DynSecretProvider`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cadence_types::error::RepositoryError;
use cadence_types::secret::{SecretEntry, SecretScope};

/// Trait for secret storage backends (vault, keychain, environment).
///
/// Each provider stores and retrieves secret values. `SecretService` chains
/// multiple providers in priority order.
pub trait SecretProvider: Send + Sync {
    /// Retrieve a secret value by key and scope.
    /// Returns None if the secret does not exist in this provider.
    fn get(
        &self,
        key: &str,
        scope: &SecretScope,
    ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Store a secret value.
    fn set(
        &self,
        key: &str,
        value: &str,
        scope: &SecretScope,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a secret.
    fn delete(
        &self,
        key: &str,
        scope: &SecretScope,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// List all secret entries (metadata only, no values) for a given scope.
    fn list(
        &self,
        scope: &SecretScope,
    ) -> impl Future<Output = Result<Vec<SecretEntry>, RepositoryError>> + Send;
}

/// Object-safe version of [`SecretProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch (`dyn SecretProviderDyn`).
/// A blanket implementation is provided for all types implementing
/// `SecretProvider`.
pub trait SecretProviderDyn: Send + Sync {
    fn get_boxed<'a>(
        &'a self,
        key: &'a str,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, RepositoryError>> + Send + 'a>>;

    fn set_boxed<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>>;

    fn delete_boxed<'a>(
        &'a self,
        key: &'a str,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>>;

    fn list_boxed<'a>(
        &'a self,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SecretEntry>, RepositoryError>> + Send + 'a>>;
}

/// Blanket implementation: any `SecretProvider` automatically implements
/// `SecretProviderDyn`.
impl<T: SecretProvider> SecretProviderDyn for T {
    fn get_boxed<'a>(
        &'a self,
        key: &'a str,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, RepositoryError>> + Send + 'a>> {
        Box::pin(self.get(key, scope))
    }

    fn set_boxed<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>> {
        Box::pin(self.set(key, value, scope))
    }

    fn delete_boxed<'a>(
        &'a self,
        key: &'a str,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>> {
        Box::pin(self.delete(key, scope))
    }

    fn list_boxed<'a>(
        &'a self,
        scope: &'a SecretScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SecretEntry>, RepositoryError>> + Send + 'a>> {
        Box::pin(self.list(scope))
    }
}

/// Type-erased secret provider, as stored in the resolution chain.
pub type DynSecretProvider = Arc<dyn SecretProviderDyn>;
