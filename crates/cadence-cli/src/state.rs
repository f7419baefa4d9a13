//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the CLI commands.
//! Services are generic over repository/hasher traits, but AppState pins
//! them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cadence_core::dispatch::Dispatcher;
use cadence_core::job::registry::JobRegistry;
use cadence_core::runner::JobRunner;
use cadence_core::service::secret::SecretService;
use cadence_infra::config::{load_global_config, resolve_jobs_dir};
use cadence_infra::crypto::hash::Sha256ContentHasher;
use cadence_infra::crypto::vault::VaultCrypto;
use cadence_infra::filesystem::resolve_data_dir;
use cadence_infra::secret::chain::build_secret_chain;
use cadence_infra::secret::VaultSecretProvider;
use cadence_infra::sqlite::pool::DatabasePool;
use cadence_infra::sqlite::run::SqliteRunRepository;
use cadence_infra::sqlite::secret::SqliteSecretRepository;
use cadence_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra
/// implementations.
pub type ConcreteRunner = JobRunner<SqliteRunRepository, Sha256ContentHasher>;
pub type ConcreteDispatcher = Dispatcher<SqliteRunRepository, Sha256ContentHasher>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub config: GlobalConfig,
    pub secret_service: Arc<SecretService>,
    pub run_repo: Arc<SqliteRunRepository>,
    pub runner: Arc<ConcreteRunner>,
    pub data_dir: PathBuf,
    pub jobs_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let jobs_dir = resolve_jobs_dir(&data_dir, &config);

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("cadence.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let run_repo = Arc::new(SqliteRunRepository::new(db_pool.clone()));

        // Wire secret service with resolution chain.
        // The vault master key is stored in a file (vault.key) rather than
        // the OS keychain so the headless daemon never blocks on an
        // authorization prompt.
        let vault_key_path = data_dir.join("vault.key");
        let vault_crypto = VaultCrypto::from_key_file(&vault_key_path)?;

        let secret_repo = SqliteSecretRepository::new(db_pool.clone());
        let vault_provider = VaultSecretProvider::new(secret_repo, vault_crypto);
        // KeychainProvider is not included in the chain: each keychain entry
        // can trigger a separate authorization prompt, one per secret per
        // run. Operators who want keychain-backed secrets can export them as
        // environment variables instead.
        let secret_chain = build_secret_chain(vault_provider, None, true);
        let secret_service = Arc::new(SecretService::new(secret_chain));

        let runner = Arc::new(JobRunner::new(
            Arc::clone(&run_repo),
            Arc::clone(&secret_service),
            Arc::new(Sha256ContentHasher::new()),
            config.default_timeout_secs.map(Duration::from_secs),
        ));

        Ok(Self {
            config,
            secret_service,
            run_repo,
            runner,
            data_dir,
            jobs_dir,
            db_pool,
        })
    }

    /// Load the job registry from the jobs directory.
    pub async fn load_registry(&self) -> anyhow::Result<JobRegistry> {
        Ok(JobRegistry::load(&self.jobs_dir).await?)
    }

    /// Build a dispatcher over a freshly loaded registry.
    pub async fn dispatcher(&self, config: &GlobalConfig) -> anyhow::Result<ConcreteDispatcher> {
        let registry = self.load_registry().await?;
        Ok(Dispatcher::new(
            registry,
            Arc::clone(&self.runner),
            Arc::clone(&self.run_repo),
            config,
        )
        .await?)
    }
}
