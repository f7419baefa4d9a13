//! Run repository trait definition.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cadence_types::error::RepositoryError;
use cadence_types::run::JobRun;

/// Trait for run record storage.
///
/// A run is inserted once with status `Running` at dispatch and updated
/// exactly once to its terminal state by `finish_run`.
pub trait RunRepository: Send + Sync {
    /// Insert a new run record (status `Running`).
    fn create_run(
        &self,
        run: &JobRun,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Update a run to its terminal state (status, failed phase, exit code,
    /// digest, finish time, error).
    fn finish_run(
        &self,
        run: &JobRun,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Fetch a single run by id.
    fn get_run(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<JobRun, RepositoryError>> + Send;

    /// Most recent runs for a job, newest first.
    fn list_runs(
        &self,
        job_name: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<JobRun>, RepositoryError>> + Send;

    /// Most recent runs across all jobs, newest first.
    fn list_recent(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<JobRun>, RepositoryError>> + Send;

    /// Start time of the most recent cron-triggered run for a job, used as
    /// the missed-run detection baseline.
    fn last_cron_fire(
        &self,
        job_name: &str,
    ) -> impl std::future::Future<Output = Result<Option<DateTime<Utc>>, RepositoryError>> + Send;

    /// Delete run records beyond the newest `keep` for a job. Returns the
    /// number of deleted rows.
    fn prune_runs(
        &self,
        job_name: &str,
        keep: u32,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
