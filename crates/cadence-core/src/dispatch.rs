//! Dispatcher: wires the job registry, trigger index, cron scheduler, and
//! runner into the two entry points the system has -- manual dispatch and
//! cron dispatch -- plus the optional catch-up pass on daemon start.
//!
//! Both entry points build a `TriggerContext` and hand the job to the same
//! `JobRunner::execute`, so manual and scheduled runs are behaviorally
//! identical apart from the recorded trigger metadata. Overlapping runs are
//! not serialized; the dispatcher only tracks active runs for display.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use cadence_types::config::GlobalConfig;
use cadence_types::error::{JobError, RepositoryError};
use cadence_types::run::JobRun;

use crate::job::registry::JobRegistry;
use crate::repository::run::RunRepository;
use crate::runner::JobRunner;
use crate::schedule::{CronCallback, CronScheduler, SchedulerError};
use crate::service::hash::ContentHasher;
use crate::trigger::{TriggerContext, TriggerError, TriggerIndex};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while dispatching jobs.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Coordinates trigger firings into job runs.
pub struct Dispatcher<R, H> {
    registry: JobRegistry,
    triggers: TriggerIndex,
    scheduler: CronScheduler,
    runner: Arc<JobRunner<R, H>>,
    repo: Arc<R>,
    catch_up: bool,
    keep_runs: u32,
    /// Currently executing runs: token -> job name. Display only.
    active: DashMap<Uuid, String>,
}

impl<R, H> Dispatcher<R, H>
where
    R: RunRepository + 'static,
    H: ContentHasher + 'static,
{
    /// Build a dispatcher over a loaded registry, registering every job's
    /// triggers into the index.
    pub async fn new(
        registry: JobRegistry,
        runner: Arc<JobRunner<R, H>>,
        repo: Arc<R>,
        config: &GlobalConfig,
    ) -> Result<Self, DispatchError> {
        let triggers = TriggerIndex::new();
        for job in registry.iter() {
            triggers.register_job(&job.name, &job.triggers).await?;
        }

        Ok(Self {
            registry,
            triggers,
            scheduler: CronScheduler::new(),
            runner,
            repo,
            catch_up: config.catch_up,
            keep_runs: config.keep_runs,
            active: DashMap::new(),
        })
    }

    /// Dispatch a job on explicit operator request.
    ///
    /// Refused when the job does not declare a `manual` trigger.
    pub async fn dispatch_manual(&self, job_name: &str) -> Result<JobRun, DispatchError> {
        let job = self.registry.get(job_name)?.clone();
        if !self.triggers.has_manual(job_name).await {
            return Err(JobError::ManualNotDeclared(job_name.to_string()).into());
        }

        let ctx = TriggerContext::manual(job_name);
        self.run(&job, &ctx).await
    }

    /// Dispatch a job because its cron schedule fired.
    pub async fn dispatch_cron(
        &self,
        job_name: &str,
        schedule: &str,
    ) -> Result<JobRun, DispatchError> {
        let job = self.registry.get(job_name)?.clone();
        let ctx = TriggerContext::cron(job_name, schedule);
        self.run(&job, &ctx).await
    }

    /// Start the cron scheduler: register every cron entry, then run the
    /// catch-up pass when enabled. Returns the number of scheduled entries.
    pub async fn start(self: &Arc<Self>) -> Result<usize, DispatchError> {
        self.scheduler.start().await?;

        let entries = self.triggers.cron_entries().await;
        for (job_name, schedule) in &entries {
            let dispatcher = Arc::clone(self);
            let schedule_for_ctx = schedule.clone();
            let callback: CronCallback = Arc::new(move |name, _fired_at| {
                let dispatcher = Arc::clone(&dispatcher);
                let schedule = schedule_for_ctx.clone();
                Box::pin(async move {
                    if let Err(e) = dispatcher.dispatch_cron(&name, &schedule).await {
                        tracing::error!(job = name.as_str(), error = %e, "cron dispatch failed");
                    }
                })
            });

            self.scheduler
                .schedule_job(job_name, schedule, callback)
                .await?;
        }

        if self.catch_up {
            self.catch_up_missed(&entries).await?;
        }

        Ok(entries.len())
    }

    /// Stop the cron scheduler. In-flight runs complete on their own.
    pub async fn stop(&self) -> Result<(), DispatchError> {
        self.scheduler.stop().await?;
        Ok(())
    }

    /// Names of jobs with a run currently in flight.
    pub fn active_runs(&self) -> Vec<String> {
        self.active.iter().map(|e| e.value().clone()).collect()
    }

    /// The loaded job registry.
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Dispatch at most one catch-up run per job whose schedule fired while
    /// the daemon was down.
    async fn catch_up_missed(
        &self,
        entries: &[(String, String)],
    ) -> Result<(), DispatchError> {
        let mut caught_up: Vec<&str> = Vec::new();

        for (job_name, schedule) in entries {
            if caught_up.contains(&job_name.as_str()) {
                continue;
            }

            let last_fired = self.repo.last_cron_fire(job_name).await?;
            let missed = self.scheduler.check_missed_runs(&[(
                job_name.clone(),
                schedule.clone(),
                last_fired,
            )]);

            if let Some((_, times)) = missed.first() {
                tracing::info!(
                    job = job_name.as_str(),
                    missed = times.len(),
                    "catching up missed schedule"
                );
                caught_up.push(job_name.as_str());
                if let Err(e) = self.dispatch_cron(job_name, schedule).await {
                    tracing::error!(job = job_name.as_str(), error = %e, "catch-up dispatch failed");
                }
            }
        }

        Ok(())
    }

    /// Execute the run and prune history afterwards.
    async fn run(
        &self,
        job: &cadence_types::job::JobDefinition,
        ctx: &TriggerContext,
    ) -> Result<JobRun, DispatchError> {
        let token = Uuid::now_v7();
        self.active.insert(token, job.name.clone());

        let result = self.runner.execute(job, ctx).await;
        self.active.remove(&token);
        let run = result?;

        if let Err(e) = self.repo.prune_runs(&job.name, self.keep_runs).await {
            tracing::warn!(job = job.name.as_str(), error = %e, "run pruning failed");
        }

        Ok(run)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
