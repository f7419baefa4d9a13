//! SQLite storage for encrypted secret values.
//!
//! Stores hex-encoded AES-256-GCM ciphertext; encryption happens in
//! `VaultSecretProvider` before values reach this layer. The table keeps
//! key/scope metadata so the vault can enumerate secrets (the keychain and
//! env providers cannot).

use cadence_types::error::RepositoryError;
use cadence_types::secret::{SecretBackend, SecretEntry, SecretKey, SecretScope};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// Raw storage for encrypted secret values, keyed by `(key, scope)`.
pub struct SqliteSecretRepository {
    pool: DatabasePool,
}

impl SqliteSecretRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Fetch the stored (encrypted, hex-encoded) value for a key.
    pub async fn get(
        &self,
        key: &str,
        scope: &SecretScope,
    ) -> Result<Option<String>, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT encrypted_value FROM secrets WHERE key = ? AND scope = ?")
                .bind(key)
                .bind(scope.to_string())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(row.map(|(value,)| value))
    }

    /// Upsert the stored (encrypted, hex-encoded) value for a key.
    pub async fn set(
        &self,
        key: &str,
        encrypted_value: &str,
        scope: &SecretScope,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO secrets (id, key, encrypted_value, scope, backend, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'vault', ?, ?)
             ON CONFLICT(key, scope) DO UPDATE SET encrypted_value = excluded.encrypted_value, updated_at = excluded.updated_at",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(key)
        .bind(encrypted_value)
        .bind(scope.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    /// Delete a stored secret.
    pub async fn delete(&self, key: &str, scope: &SecretScope) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM secrets WHERE key = ? AND scope = ?")
            .bind(key)
            .bind(scope.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// List secret metadata for a scope (no values).
    pub async fn list(&self, scope: &SecretScope) -> Result<Vec<SecretEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT key, created_at, updated_at FROM secrets WHERE scope = ? ORDER BY key",
        )
        .bind(scope.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let key: String = row
                    .try_get("key")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let created_at: String = row
                    .try_get("created_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let updated_at: String = row
                    .try_get("updated_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;

                Ok(SecretEntry {
                    key: SecretKey::new(key),
                    backend: SecretBackend::Vault,
                    scope: scope.clone(),
                    created_at: parse_datetime(&created_at)?,
                    updated_at: parse_datetime(&updated_at)?,
                })
            })
            .collect()
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> SqliteSecretRepository {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        SqliteSecretRepository::new(DatabasePool::new(&url).await.unwrap())
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let repo = test_repo().await;
        repo.set("KURLY_LOGIN_ID", "deadbeef", &SecretScope::Global)
            .await
            .unwrap();

        let value = repo
            .get("KURLY_LOGIN_ID", &SecretScope::Global)
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("deadbeef"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = test_repo().await;
        let value = repo.get("NOPE", &SecretScope::Global).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let repo = test_repo().await;
        repo.set("KEY", "aaaa", &SecretScope::Global).await.unwrap();
        repo.set("KEY", "bbbb", &SecretScope::Global).await.unwrap();

        let value = repo.get("KEY", &SecretScope::Global).await.unwrap();
        assert_eq!(value.as_deref(), Some("bbbb"));
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let repo = test_repo().await;
        let job_scope = SecretScope::Job("commute-end".to_string());

        repo.set("KEY", "global-enc", &SecretScope::Global)
            .await
            .unwrap();
        repo.set("KEY", "job-enc", &job_scope).await.unwrap();

        assert_eq!(
            repo.get("KEY", &SecretScope::Global).await.unwrap().as_deref(),
            Some("global-enc")
        );
        assert_eq!(
            repo.get("KEY", &job_scope).await.unwrap().as_deref(),
            Some("job-enc")
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = test_repo().await;
        repo.set("KEY", "aaaa", &SecretScope::Global).await.unwrap();
        repo.delete("KEY", &SecretScope::Global).await.unwrap();

        assert!(repo.get("KEY", &SecretScope::Global).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_not_found() {
        let repo = test_repo().await;
        let result = repo.delete("GHOST", &SecretScope::Global).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_sorted_metadata_only() {
        let repo = test_repo().await;
        repo.set("KURLY_PASSWORD", "x", &SecretScope::Global)
            .await
            .unwrap();
        repo.set("GOOGLE_CREDENTIALS_JSON", "y", &SecretScope::Global)
            .await
            .unwrap();

        let entries = repo.list(&SecretScope::Global).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key.0, "GOOGLE_CREDENTIALS_JSON");
        assert_eq!(entries[1].key.0, "KURLY_PASSWORD");
        assert_eq!(entries[0].backend, SecretBackend::Vault);
    }
}
