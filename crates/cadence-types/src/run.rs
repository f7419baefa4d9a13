//! Run tracking types: one record per dispatched job invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::job::JobId;

/// Overall status of a job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobRunStatus {
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for JobRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobRunStatus::Running => write!(f, "running"),
            JobRunStatus::Succeeded => write!(f, "succeeded"),
            JobRunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The phases of a run, in their fixed execution order.
///
/// A phase failure aborts the run before any later phase executes; in
/// particular an `Install` failure means the script is never invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Working directory and script file exist.
    Workspace,
    /// The interpreter binary responds to a version probe.
    Interpreter,
    /// Dependency manifest installed.
    Install,
    /// The script subprocess itself.
    Invoke,
}

impl RunPhase {
    /// All phases in execution order.
    pub const ORDER: [RunPhase; 4] = [
        RunPhase::Workspace,
        RunPhase::Interpreter,
        RunPhase::Install,
        RunPhase::Invoke,
    ];
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Workspace => write!(f, "workspace"),
            RunPhase::Interpreter => write!(f, "interpreter"),
            RunPhase::Install => write!(f, "install"),
            RunPhase::Invoke => write!(f, "invoke"),
        }
    }
}

/// What fired a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Cron,
    Manual,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::Cron => write!(f, "cron"),
            TriggerKind::Manual => write!(f, "manual"),
        }
    }
}

/// A single execution instance of a job. Used for query results and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    /// UUIDv7 run ID.
    pub id: Uuid,
    /// ID of the job definition being executed.
    pub job_id: JobId,
    /// Name of the job (denormalized for display).
    pub job_name: String,
    /// Current run status.
    pub status: JobRunStatus,
    /// How this run was triggered.
    pub trigger_kind: TriggerKind,
    /// Trigger source detail (cron expression, or "cli" for manual runs).
    pub trigger_source: String,
    /// The phase that failed, when the run failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<RunPhase>,
    /// Exit code of the script subprocess (None until invoked, or when the
    /// process was terminated by a signal).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// SHA-256 digest of the script file that was executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_sha256: Option<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished (None if still running).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message if the run failed. Never contains secret values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_serde() {
        for status in [
            JobRunStatus::Running,
            JobRunStatus::Succeeded,
            JobRunStatus::Failed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let parsed: JobRunStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_run_phase_order_is_fixed() {
        assert_eq!(
            RunPhase::ORDER,
            [
                RunPhase::Workspace,
                RunPhase::Interpreter,
                RunPhase::Install,
                RunPhase::Invoke,
            ]
        );
    }

    #[test]
    fn test_run_phase_display() {
        assert_eq!(RunPhase::Install.to_string(), "install");
        assert_eq!(RunPhase::Invoke.to_string(), "invoke");
    }

    #[test]
    fn test_trigger_kind_display() {
        assert_eq!(TriggerKind::Cron.to_string(), "cron");
        assert_eq!(TriggerKind::Manual.to_string(), "manual");
    }

    #[test]
    fn test_job_run_json_roundtrip() {
        let run = JobRun {
            id: Uuid::now_v7(),
            job_id: JobId::new(),
            job_name: "commute-end".to_string(),
            status: JobRunStatus::Failed,
            trigger_kind: TriggerKind::Cron,
            trigger_source: "0 * * * *".to_string(),
            failed_phase: Some(RunPhase::Install),
            exit_code: None,
            script_sha256: Some("ab".repeat(32)),
            started_at: Utc::now(),
            finished_at: Some(Utc::now()),
            error: Some("dependency install exited with status 1".to_string()),
        };
        let json_str = serde_json::to_string(&run).unwrap();
        let parsed: JobRun = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.job_name, "commute-end");
        assert_eq!(parsed.status, JobRunStatus::Failed);
        assert_eq!(parsed.failed_phase, Some(RunPhase::Install));
        assert!(parsed.exit_code.is_none());
    }
}
