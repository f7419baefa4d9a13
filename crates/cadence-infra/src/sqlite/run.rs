//! SQLite run repository implementation.
//!
//! Implements `RunRepository` from `cadence-core` using sqlx with split
//! read/write pools. One row per dispatched run; enum fields are stored as
//! their snake_case serde strings, timestamps as RFC 3339 text.

use cadence_core::repository::run::RunRepository;
use cadence_types::error::RepositoryError;
use cadence_types::job::JobId;
use cadence_types::run::{JobRun, JobRunStatus, RunPhase, TriggerKind};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `RunRepository`.
pub struct SqliteRunRepository {
    pool: DatabasePool,
}

impl SqliteRunRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct JobRunRow {
    id: String,
    job_id: String,
    job_name: String,
    status: String,
    trigger_kind: String,
    trigger_source: String,
    failed_phase: Option<String>,
    exit_code: Option<i32>,
    script_sha256: Option<String>,
    started_at: String,
    finished_at: Option<String>,
    error: Option<String>,
}

impl JobRunRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            job_id: row.try_get("job_id")?,
            job_name: row.try_get("job_name")?,
            status: row.try_get("status")?,
            trigger_kind: row.try_get("trigger_kind")?,
            trigger_source: row.try_get("trigger_source")?,
            failed_phase: row.try_get("failed_phase")?,
            exit_code: row.try_get("exit_code")?,
            script_sha256: row.try_get("script_sha256")?,
            started_at: row.try_get("started_at")?,
            finished_at: row.try_get("finished_at")?,
            error: row.try_get("error")?,
        })
    }

    fn into_run(self) -> Result<JobRun, RepositoryError> {
        let id = parse_uuid(&self.id)?;
        let job_id = JobId(parse_uuid(&self.job_id)?);

        let status: JobRunStatus = parse_enum(&self.status, "run status")?;
        let trigger_kind: TriggerKind = parse_enum(&self.trigger_kind, "trigger kind")?;
        let failed_phase: Option<RunPhase> = self
            .failed_phase
            .as_deref()
            .map(|s| parse_enum(s, "run phase"))
            .transpose()?;

        let started_at = parse_datetime(&self.started_at)?;
        let finished_at = self
            .finished_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;

        Ok(JobRun {
            id,
            job_id,
            job_name: self.job_name,
            status,
            trigger_kind,
            trigger_source: self.trigger_source,
            failed_phase,
            exit_code: self.exit_code,
            script_sha256: self.script_sha256,
            started_at,
            finished_at,
            error: self.error,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid uuid '{s}': {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime '{s}': {e}")))
}

/// Parse a snake_case enum string through its serde representation.
fn parse_enum<T: serde::de::DeserializeOwned>(s: &str, what: &str) -> Result<T, RepositoryError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| RepositoryError::Query(format!("invalid {what}: {s}")))
}

/// Serialize an enum to its snake_case serde string.
fn enum_str<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        _ => Err(RepositoryError::Query("non-string enum value".to_string())),
    }
}

// ---------------------------------------------------------------------------
// RunRepository impl
// ---------------------------------------------------------------------------

impl RunRepository for SqliteRunRepository {
    async fn create_run(&self, run: &JobRun) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO job_runs (id, job_id, job_name, status, trigger_kind, trigger_source,
                                   failed_phase, exit_code, script_sha256, started_at, finished_at, error)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(run.id.to_string())
        .bind(run.job_id.to_string())
        .bind(&run.job_name)
        .bind(enum_str(&run.status)?)
        .bind(enum_str(&run.trigger_kind)?)
        .bind(&run.trigger_source)
        .bind(run.failed_phase.map(|p| enum_str(&p)).transpose()?)
        .bind(run.exit_code)
        .bind(&run.script_sha256)
        .bind(run.started_at.to_rfc3339())
        .bind(run.finished_at.map(|t| t.to_rfc3339()))
        .bind(&run.error)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn finish_run(&self, run: &JobRun) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE job_runs SET status = ?, failed_phase = ?, exit_code = ?,
                                 script_sha256 = ?, finished_at = ?, error = ?
             WHERE id = ?",
        )
        .bind(enum_str(&run.status)?)
        .bind(run.failed_phase.map(|p| enum_str(&p)).transpose()?)
        .bind(run.exit_code)
        .bind(&run.script_sha256)
        .bind(run.finished_at.map(|t| t.to_rfc3339()))
        .bind(&run.error)
        .bind(run.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> Result<JobRun, RepositoryError> {
        let row = sqlx::query("SELECT * FROM job_runs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        JobRunRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_run()
    }

    async fn list_runs(&self, job_name: &str, limit: u32) -> Result<Vec<JobRun>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM job_runs WHERE job_name = ? ORDER BY started_at DESC LIMIT ?",
        )
        .bind(job_name)
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                JobRunRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_run()
            })
            .collect()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<JobRun>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM job_runs ORDER BY started_at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                JobRunRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_run()
            })
            .collect()
    }

    async fn last_cron_fire(
        &self,
        job_name: &str,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT MAX(started_at) FROM job_runs WHERE job_name = ? AND trigger_kind = 'cron'",
        )
        .bind(job_name)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row.and_then(|(max,)| max) {
            Some(s) => Ok(Some(parse_datetime(&s)?)),
            None => Ok(None),
        }
    }

    async fn prune_runs(&self, job_name: &str, keep: u32) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM job_runs WHERE job_name = ? AND id NOT IN (
                 SELECT id FROM job_runs WHERE job_name = ?
                 ORDER BY started_at DESC LIMIT ?
             )",
        )
        .bind(job_name)
        .bind(job_name)
        .bind(keep)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_run(job_name: &str, kind: TriggerKind, started_at: DateTime<Utc>) -> JobRun {
        JobRun {
            id: Uuid::now_v7(),
            job_id: JobId::new(),
            job_name: job_name.to_string(),
            status: JobRunStatus::Running,
            trigger_kind: kind,
            trigger_source: match kind {
                TriggerKind::Cron => "0 * * * *".to_string(),
                TriggerKind::Manual => "cli".to_string(),
            },
            failed_phase: None,
            exit_code: None,
            script_sha256: None,
            started_at,
            finished_at: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_create_finish_get_roundtrip() {
        let repo = SqliteRunRepository::new(test_pool().await);

        let mut run = make_run("commute-end", TriggerKind::Cron, Utc::now());
        repo.create_run(&run).await.unwrap();

        run.status = JobRunStatus::Failed;
        run.failed_phase = Some(RunPhase::Install);
        run.script_sha256 = Some("ab".repeat(32));
        run.finished_at = Some(Utc::now());
        run.error = Some("dependency install exited with exit status: 1".to_string());
        repo.finish_run(&run).await.unwrap();

        let stored = repo.get_run(run.id).await.unwrap();
        assert_eq!(stored.status, JobRunStatus::Failed);
        assert_eq!(stored.failed_phase, Some(RunPhase::Install));
        assert_eq!(stored.trigger_kind, TriggerKind::Cron);
        assert_eq!(stored.script_sha256.as_deref(), Some(&*"ab".repeat(32)));
        assert!(stored.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_run() {
        let repo = SqliteRunRepository::new(test_pool().await);
        let result = repo.get_run(Uuid::now_v7()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_finish_missing_run() {
        let repo = SqliteRunRepository::new(test_pool().await);
        let run = make_run("ghost", TriggerKind::Manual, Utc::now());
        let result = repo.finish_run(&run).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_runs_newest_first() {
        let repo = SqliteRunRepository::new(test_pool().await);

        let base = Utc::now();
        for i in 0..3 {
            let run = make_run(
                "commute-end",
                TriggerKind::Cron,
                base - Duration::hours(3 - i),
            );
            repo.create_run(&run).await.unwrap();
        }
        // A run from another job is excluded.
        repo.create_run(&make_run("other", TriggerKind::Manual, base))
            .await
            .unwrap();

        let runs = repo.list_runs("commute-end", 10).await.unwrap();
        assert_eq!(runs.len(), 3);
        assert!(runs[0].started_at > runs[1].started_at);
        assert!(runs[1].started_at > runs[2].started_at);

        let limited = repo.list_runs("commute-end", 2).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_last_cron_fire_ignores_manual() {
        let repo = SqliteRunRepository::new(test_pool().await);

        let cron_time = Utc::now() - Duration::hours(2);
        repo.create_run(&make_run("commute-end", TriggerKind::Cron, cron_time))
            .await
            .unwrap();
        // A newer manual run must not move the baseline.
        repo.create_run(&make_run("commute-end", TriggerKind::Manual, Utc::now()))
            .await
            .unwrap();

        let last = repo.last_cron_fire("commute-end").await.unwrap().unwrap();
        assert!((last - cron_time).num_seconds().abs() < 2);
    }

    #[tokio::test]
    async fn test_last_cron_fire_no_runs() {
        let repo = SqliteRunRepository::new(test_pool().await);
        let last = repo.last_cron_fire("commute-end").await.unwrap();
        assert!(last.is_none());
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let repo = SqliteRunRepository::new(test_pool().await);

        let base = Utc::now();
        for i in 0..5 {
            let run = make_run(
                "commute-end",
                TriggerKind::Cron,
                base - Duration::minutes(10 - i),
            );
            repo.create_run(&run).await.unwrap();
        }

        let deleted = repo.prune_runs("commute-end", 2).await.unwrap();
        assert_eq!(deleted, 3);

        let remaining = repo.list_runs("commute-end", 10).await.unwrap();
        assert_eq!(remaining.len(), 2);
        // The newest two survived.
        assert!(remaining[0].started_at > remaining[1].started_at);
        assert!((remaining[1].started_at - (base - Duration::minutes(7))).num_seconds().abs() < 2);
    }
}
