//! Cron scheduler wrapping `tokio-cron-scheduler` for job triggers.
//!
//! Provides:
//! - Standard cron expression parsing (6-field with seconds)
//! - Human-readable schedule normalization ("hourly" -> cron)
//! - Missed-run detection for catch-up on daemon restart
//! - Next-occurrence computation for display
//! - Per-job lifecycle (schedule, unschedule, start, stop)
//!
//! All schedules are evaluated in UTC.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during scheduling operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Failed to create or manipulate a cron entry.
    #[error("scheduler error: {0}")]
    JobError(String),

    /// Invalid cron expression or schedule string.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Job not found in the scheduler.
    #[error("job '{0}' not registered in scheduler")]
    JobNotFound(String),
}

// ---------------------------------------------------------------------------
// Human-readable schedule normalization
// ---------------------------------------------------------------------------

/// Normalize a schedule string to a 6-field cron expression with seconds.
///
/// Accepted inputs (case-insensitive):
/// - 5-field cron ("0 * * * *")    -> "0 0 * * * *" (seconds prepended)
/// - 6-field cron                  -> unchanged
/// - "every N seconds"             -> "*/N * * * * *"
/// - "every N minutes"             -> "0 */N * * * *"
/// - "every N hours"               -> "0 0 */N * * *"
/// - "every minute" / "minutely"   -> "0 * * * * *"
/// - "every hour" / "hourly"       -> "0 0 * * * *"
/// - "every day" / "daily"         -> "0 0 0 * * *"
/// - "every day at HH:MM"          -> "0 MM HH * * *"
pub fn normalize_schedule(input: &str) -> Result<String, SchedulerError> {
    let trimmed = input.trim();

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() == 5 {
        // Standard 5-field cron -- prepend "0" for seconds
        return Ok(format!("0 {trimmed}"));
    }
    if parts.len() == 6 {
        // Already 6-field cron with seconds
        return Ok(trimmed.to_string());
    }

    let lower = trimmed.to_lowercase();

    if lower == "every minute" || lower == "minutely" {
        return Ok("0 * * * * *".to_string());
    }
    if lower == "every hour" || lower == "hourly" {
        return Ok("0 0 * * * *".to_string());
    }
    if lower == "every day" || lower == "daily" {
        return Ok("0 0 0 * * *".to_string());
    }

    if let Some(rest) = lower.strip_prefix("every ") {
        // "every day at HH:MM"
        if let Some(at_part) = rest.strip_prefix("day at ") {
            let time_parts: Vec<&str> = at_part.split(':').collect();
            if time_parts.len() == 2 {
                let hour: u32 = time_parts[0]
                    .trim()
                    .parse()
                    .map_err(|_| SchedulerError::InvalidSchedule(input.to_string()))?;
                let minute: u32 = time_parts[1]
                    .trim()
                    .parse()
                    .map_err(|_| SchedulerError::InvalidSchedule(input.to_string()))?;
                if hour < 24 && minute < 60 {
                    return Ok(format!("0 {minute} {hour} * * *"));
                }
            }
            return Err(SchedulerError::InvalidSchedule(input.to_string()));
        }

        // "every N unit"
        let words: Vec<&str> = rest.split_whitespace().collect();
        if words.len() == 2 {
            let n: u32 = words[0]
                .parse()
                .map_err(|_| SchedulerError::InvalidSchedule(input.to_string()))?;
            if n == 0 {
                return Err(SchedulerError::InvalidSchedule(
                    "interval must be > 0".to_string(),
                ));
            }
            let unit = words[1].trim_end_matches('s');
            return match unit {
                "second" => Ok(format!("*/{n} * * * * *")),
                "minute" => Ok(format!("0 */{n} * * * *")),
                "hour" => Ok(format!("0 0 */{n} * * *")),
                _ => Err(SchedulerError::InvalidSchedule(input.to_string())),
            };
        }
    }

    Err(SchedulerError::InvalidSchedule(format!(
        "unrecognized schedule format: '{trimmed}'"
    )))
}

/// Compute the next UTC occurrence of a schedule after now.
///
/// Returns `None` when the schedule cannot be parsed or has no future
/// occurrence.
pub fn next_occurrence(schedule: &str) -> Option<DateTime<Utc>> {
    let cron_expr = normalize_schedule(schedule).ok()?;
    let cron = cron_expr.parse::<croner::Cron>().ok()?;
    cron.iter_after(Utc::now()).next()
}

// ---------------------------------------------------------------------------
// CronScheduler
// ---------------------------------------------------------------------------

/// Callback type invoked when a cron trigger fires. Receives the job name
/// and the fire time.
pub type CronCallback = Arc<
    dyn Fn(String, DateTime<Utc>) -> futures_util::future::BoxFuture<'static, ()> + Send + Sync,
>;

/// Tracks a registered cron entry for a job.
struct ScheduledJob {
    /// The entry UUID assigned by tokio-cron-scheduler.
    entry_id: Uuid,
    /// The normalized cron expression.
    cron_expr: String,
}

/// Cron scheduler that wraps `tokio-cron-scheduler::JobScheduler`.
///
/// Manages the lifecycle of cron-triggered jobs, keyed by job name:
/// - Schedules jobs with cron expressions (standard or human-readable)
/// - Provides missed-run detection for catch-up on restart
/// - Supports start/stop lifecycle
pub struct CronScheduler {
    /// The underlying tokio-cron-scheduler instance.
    inner: Arc<RwLock<Option<JobScheduler>>>,
    /// Registered jobs: job name -> entry metadata.
    entries: Arc<RwLock<HashMap<String, ScheduledJob>>>,
}

impl CronScheduler {
    /// Create a new cron scheduler (not yet started).
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start the scheduler. Must be called before scheduling jobs.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;

        scheduler
            .start()
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;

        let mut inner = self.inner.write().await;
        *inner = Some(scheduler);

        tracing::info!("cron scheduler started");
        Ok(())
    }

    /// Stop the scheduler and remove all entries.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let mut inner = self.inner.write().await;
        if let Some(mut scheduler) = inner.take() {
            scheduler
                .shutdown()
                .await
                .map_err(|e| SchedulerError::JobError(e.to_string()))?;
            tracing::info!("cron scheduler stopped");
        }
        let mut entries = self.entries.write().await;
        entries.clear();
        Ok(())
    }

    /// Schedule a job to run on a cron schedule.
    ///
    /// The `schedule` can be a standard cron expression or a human-readable
    /// string (see [`normalize_schedule`]). The `callback` is invoked each
    /// time the cron fires.
    pub async fn schedule_job(
        &self,
        job_name: &str,
        schedule: &str,
        callback: CronCallback,
    ) -> Result<(), SchedulerError> {
        let cron_expr = normalize_schedule(schedule)?;

        let inner = self.inner.read().await;
        let scheduler = inner
            .as_ref()
            .ok_or_else(|| SchedulerError::JobError("scheduler not started".to_string()))?;

        let name = job_name.to_string();
        let entry = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let cb = callback.clone();
            let name = name.clone();
            Box::pin(async move {
                let now = Utc::now();
                tracing::debug!(job = name.as_str(), %now, "cron trigger fired");
                cb(name, now).await;
            })
        })
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;

        let entry_id = entry.guid();
        scheduler
            .add(entry)
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;

        let mut entries = self.entries.write().await;
        entries.insert(
            job_name.to_string(),
            ScheduledJob {
                entry_id,
                cron_expr: cron_expr.clone(),
            },
        );

        tracing::info!(job = job_name, cron = cron_expr.as_str(), "job scheduled");
        Ok(())
    }

    /// Remove a job from the cron scheduler.
    pub async fn unschedule_job(&self, job_name: &str) -> Result<(), SchedulerError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .remove(job_name)
            .ok_or_else(|| SchedulerError::JobNotFound(job_name.to_string()))?;

        let inner = self.inner.read().await;
        if let Some(scheduler) = inner.as_ref() {
            scheduler
                .remove(&entry.entry_id)
                .await
                .map_err(|e| SchedulerError::JobError(e.to_string()))?;
        }

        tracing::info!(job = job_name, "job unscheduled");
        Ok(())
    }

    /// The normalized cron expression registered for a job, if any.
    pub async fn cron_expr(&self, job_name: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(job_name).map(|e| e.cron_expr.clone())
    }

    /// Check for missed cron runs since each job's last known fire.
    ///
    /// Takes `(job_name, schedule, last_fired)` tuples and returns
    /// `(job_name, missed_timestamps)` for jobs whose schedule would have
    /// fired between `last_fired` and now. Jobs without a baseline are
    /// skipped. Used on daemon restart to catch up jobs that should have run
    /// while the scheduler was down.
    pub fn check_missed_runs(
        &self,
        schedules: &[(String, String, Option<DateTime<Utc>>)],
    ) -> Vec<(String, Vec<DateTime<Utc>>)> {
        let now = Utc::now();
        let mut missed = Vec::new();

        for (job_name, schedule, last_fired) in schedules {
            let cron_expr = match normalize_schedule(schedule) {
                Ok(expr) => expr,
                Err(_) => continue,
            };

            let cron = match cron_expr.parse::<croner::Cron>() {
                Ok(c) => c,
                Err(_) => continue,
            };

            let from = match last_fired {
                Some(t) => *t,
                None => continue, // No baseline, can't detect misses
            };

            let mut missed_times = Vec::new();
            for next in cron.iter_after(from) {
                if next >= now {
                    break;
                }
                missed_times.push(next);
            }

            if !missed_times.is_empty() {
                tracing::warn!(
                    job = job_name.as_str(),
                    count = missed_times.len(),
                    "detected missed cron runs"
                );
                missed.push((job_name.clone(), missed_times));
            }
        }

        missed
    }

    /// Get the number of scheduled jobs.
    pub async fn job_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for CronScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // -------------------------------------------------------------------
    // normalize_schedule
    // -------------------------------------------------------------------

    #[test]
    fn test_normalize_top_of_hour_5field() {
        // The reference job's schedule: minute 0 of every hour.
        let result = normalize_schedule("0 * * * *").unwrap();
        assert_eq!(result, "0 0 * * * *");
    }

    #[test]
    fn test_normalize_6field_cron_passthrough() {
        let result = normalize_schedule("30 */5 * * * *").unwrap();
        assert_eq!(result, "30 */5 * * * *");
    }

    #[test]
    fn test_normalize_hourly_matches_top_of_hour() {
        // "hourly" and "0 * * * *" must normalize identically.
        assert_eq!(
            normalize_schedule("hourly").unwrap(),
            normalize_schedule("0 * * * *").unwrap()
        );
    }

    #[test]
    fn test_normalize_every_5_minutes() {
        let result = normalize_schedule("every 5 minutes").unwrap();
        assert_eq!(result, "0 */5 * * * *");
    }

    #[test]
    fn test_normalize_every_10_seconds() {
        let result = normalize_schedule("every 10 seconds").unwrap();
        assert_eq!(result, "*/10 * * * * *");
    }

    #[test]
    fn test_normalize_every_2_hours() {
        let result = normalize_schedule("every 2 hours").unwrap();
        assert_eq!(result, "0 0 */2 * * *");
    }

    #[test]
    fn test_normalize_daily() {
        let result = normalize_schedule("daily").unwrap();
        assert_eq!(result, "0 0 0 * * *");
    }

    #[test]
    fn test_normalize_every_day_at_time() {
        let result = normalize_schedule("every day at 09:30").unwrap();
        assert_eq!(result, "0 30 9 * * *");
    }

    #[test]
    fn test_normalize_invalid_format() {
        assert!(normalize_schedule("run whenever").is_err());
    }

    #[test]
    fn test_normalize_zero_interval_rejected() {
        assert!(normalize_schedule("every 0 minutes").is_err());
    }

    #[test]
    fn test_normalize_case_insensitive() {
        let result = normalize_schedule("Every 5 Minutes").unwrap();
        assert_eq!(result, "0 */5 * * * *");
    }

    #[test]
    fn test_normalize_singular_unit() {
        let result = normalize_schedule("every 1 minute").unwrap();
        assert_eq!(result, "0 */1 * * * *");
    }

    // -------------------------------------------------------------------
    // next_occurrence
    // -------------------------------------------------------------------

    #[test]
    fn test_next_occurrence_hourly_is_top_of_hour() {
        let next = next_occurrence("0 * * * *").unwrap();
        assert_eq!(chrono::Timelike::minute(&next), 0);
        assert_eq!(chrono::Timelike::second(&next), 0);
        assert!(next > Utc::now());
    }

    #[test]
    fn test_next_occurrence_invalid_schedule() {
        assert!(next_occurrence("not a schedule").is_none());
    }

    // -------------------------------------------------------------------
    // check_missed_runs
    // -------------------------------------------------------------------

    #[test]
    fn test_check_missed_runs_detects_gaps() {
        let scheduler = CronScheduler::new();

        // Last fired 10 minutes ago, runs every minute
        let last_fired = Utc::now() - Duration::minutes(10);
        let schedules = vec![(
            "commute-end".to_string(),
            "every minute".to_string(),
            Some(last_fired),
        )];

        let missed = scheduler.check_missed_runs(&schedules);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].0, "commute-end");
        let count = missed[0].1.len();
        assert!(
            (8..=10).contains(&count),
            "expected 8-10 missed runs, got {count}"
        );
    }

    #[test]
    fn test_check_missed_runs_no_gap() {
        let scheduler = CronScheduler::new();

        let last_fired = Utc::now() - Duration::seconds(5);
        let schedules = vec![(
            "commute-end".to_string(),
            "hourly".to_string(),
            Some(last_fired),
        )];

        let missed = scheduler.check_missed_runs(&schedules);
        assert!(missed.is_empty(), "expected no missed runs");
    }

    #[test]
    fn test_check_missed_runs_no_baseline() {
        let scheduler = CronScheduler::new();

        let schedules = vec![("commute-end".to_string(), "every minute".to_string(), None)];

        let missed = scheduler.check_missed_runs(&schedules);
        assert!(missed.is_empty());
    }

    #[test]
    fn test_check_missed_runs_invalid_schedule_skipped() {
        let scheduler = CronScheduler::new();

        let last_fired = Utc::now() - Duration::hours(1);
        let schedules = vec![(
            "bad".to_string(),
            "not a schedule".to_string(),
            Some(last_fired),
        )];

        let missed = scheduler.check_missed_runs(&schedules);
        assert!(missed.is_empty());
    }

    // -------------------------------------------------------------------
    // CronScheduler lifecycle (async)
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn test_scheduler_start_stop() {
        let scheduler = CronScheduler::new();
        scheduler.start().await.unwrap();
        assert_eq!(scheduler.job_count().await, 0);
        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_schedule_and_unschedule() {
        let scheduler = CronScheduler::new();
        scheduler.start().await.unwrap();

        let cb: CronCallback = Arc::new(|_name, _time| Box::pin(async {}));

        scheduler
            .schedule_job("commute-end", "hourly", cb)
            .await
            .unwrap();
        assert_eq!(scheduler.job_count().await, 1);
        assert_eq!(
            scheduler.cron_expr("commute-end").await.as_deref(),
            Some("0 0 * * * *")
        );

        scheduler.unschedule_job("commute-end").await.unwrap();
        assert_eq!(scheduler.job_count().await, 0);

        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_schedule_before_start_fails() {
        let scheduler = CronScheduler::new();
        let cb: CronCallback = Arc::new(|_name, _time| Box::pin(async {}));

        let result = scheduler.schedule_job("commute-end", "every minute", cb).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scheduler_unschedule_unknown_fails() {
        let scheduler = CronScheduler::new();
        scheduler.start().await.unwrap();

        let result = scheduler.unschedule_job("nope").await;
        assert!(result.is_err());

        scheduler.stop().await.unwrap();
    }
}
