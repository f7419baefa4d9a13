//! Trigger context and registry for job triggers.
//!
//! `TriggerIndex` is the central registry of which jobs fire on which
//! triggers. It validates trigger configurations on registration and answers
//! the two questions the dispatcher asks: which cron entries exist, and is a
//! given job allowed to be dispatched manually.
//!
//! Every firing carries a `TriggerContext` describing the trigger kind and
//! source; manual and cron dispatch differ only in this metadata, never in
//! the resulting run behavior.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use cadence_types::job::TriggerConfig;
use cadence_types::run::TriggerKind;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during trigger operations.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// Failed to register a trigger.
    #[error("trigger registration failed: {0}")]
    RegistrationFailed(String),

    /// Unknown job referenced by trigger.
    #[error("job '{0}' not found in trigger registry")]
    JobNotFound(String),
}

// ---------------------------------------------------------------------------
// TriggerContext
// ---------------------------------------------------------------------------

/// Metadata about a trigger firing event.
///
/// Passed to the runner when a trigger fires. Contains the trigger kind,
/// source, fire timestamp, and the job name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerContext {
    /// The kind of trigger that fired.
    pub kind: TriggerKind,
    /// Source identifier (cron expression, or "cli" for manual dispatch).
    pub source: String,
    /// When the trigger fired.
    pub fired_at: DateTime<Utc>,
    /// The job this trigger is associated with.
    pub job_name: String,
}

impl TriggerContext {
    /// Context for a manual operator dispatch.
    pub fn manual(job_name: impl Into<String>) -> Self {
        Self {
            kind: TriggerKind::Manual,
            source: "cli".to_string(),
            fired_at: Utc::now(),
            job_name: job_name.into(),
        }
    }

    /// Context for a cron firing of the given schedule.
    pub fn cron(job_name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            kind: TriggerKind::Cron,
            source: schedule.into(),
            fired_at: Utc::now(),
            job_name: job_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerIndex
// ---------------------------------------------------------------------------

/// Central registry of trigger configurations, keyed by job name.
///
/// Validates trigger configs on registration. The actual scheduling is
/// handled by [`crate::schedule::CronScheduler`]; the index only records
/// which job declared what.
pub struct TriggerIndex {
    registrations: Arc<RwLock<HashMap<String, Vec<TriggerConfig>>>>,
}

impl TriggerIndex {
    /// Create a new empty trigger index.
    pub fn new() -> Self {
        Self {
            registrations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register all triggers for a job, replacing any previous registration.
    pub async fn register_job(
        &self,
        job_name: &str,
        triggers: &[TriggerConfig],
    ) -> Result<(), TriggerError> {
        for config in triggers {
            Self::validate_trigger_config(config)?;
        }

        let mut registrations = self.registrations.write().await;
        registrations.insert(job_name.to_string(), triggers.to_vec());

        tracing::info!(
            job = job_name,
            trigger_count = triggers.len(),
            "registered job triggers"
        );

        Ok(())
    }

    /// Unregister all triggers for a job.
    pub async fn unregister_job(&self, job_name: &str) -> Result<(), TriggerError> {
        let mut registrations = self.registrations.write().await;
        registrations
            .remove(job_name)
            .ok_or_else(|| TriggerError::JobNotFound(job_name.to_string()))?;

        tracing::info!(job = job_name, "unregistered job triggers");
        Ok(())
    }

    /// All registered cron triggers as `(job_name, schedule)` pairs.
    pub async fn cron_entries(&self) -> Vec<(String, String)> {
        let registrations = self.registrations.read().await;
        let mut result = Vec::new();

        for (name, configs) in registrations.iter() {
            for config in configs {
                if let TriggerConfig::Cron { schedule } = config {
                    result.push((name.clone(), schedule.clone()));
                }
            }
        }

        result
    }

    /// Whether the job declares a manual trigger.
    ///
    /// Manual dispatch via the CLI is refused for jobs that don't declare
    /// one, mirroring a workflow file that omits the manual trigger.
    pub async fn has_manual(&self, job_name: &str) -> bool {
        let registrations = self.registrations.read().await;
        registrations
            .get(job_name)
            .is_some_and(|configs| configs.iter().any(|c| matches!(c, TriggerConfig::Manual {})))
    }

    /// Total number of registered jobs.
    pub async fn job_count(&self) -> usize {
        self.registrations.read().await.len()
    }

    /// Total number of individual trigger registrations.
    pub async fn trigger_count(&self) -> usize {
        self.registrations.read().await.values().map(|v| v.len()).sum()
    }

    fn validate_trigger_config(config: &TriggerConfig) -> Result<(), TriggerError> {
        match config {
            TriggerConfig::Cron { schedule } => {
                crate::schedule::normalize_schedule(schedule).map_err(|e| {
                    TriggerError::RegistrationFailed(format!(
                        "invalid cron schedule '{schedule}': {e}"
                    ))
                })?;
                Ok(())
            }
            TriggerConfig::Manual {} => Ok(()),
        }
    }
}

impl Default for TriggerIndex {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
