//! Job runner: the fixed linear invocation pipeline.
//!
//! Every run executes the same four phases in order, with no branching and
//! no recovery path:
//!
//! 1. Workspace  -- working directory and script file exist
//! 2. Interpreter -- the resolved interpreter binary answers `--version`
//! 3. Install    -- the dependency manifest installs cleanly
//! 4. Invoke     -- the script runs as a subprocess with the declared
//!    environment bindings resolved from the secret chain
//!
//! A phase failure aborts the run before any later phase; in particular an
//! install failure means the script is never invoked. The script's exit
//! status alone decides between `Succeeded` and `Failed`. Each run is
//! recorded through the run repository: inserted as `Running` at dispatch
//! and finished exactly once with its terminal state.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::process::Command;
use uuid::Uuid;

use cadence_types::error::RepositoryError;
use cadence_types::job::{Interpreter, JobDefinition, RuntimeSpec};
use cadence_types::run::{JobRun, JobRunStatus, RunPhase};
use cadence_types::secret::SecretScope;

use crate::repository::run::RunRepository;
use crate::service::hash::ContentHasher;
use crate::service::secret::SecretService;
use crate::trigger::TriggerContext;

/// Maximum characters of subprocess stderr kept in run error messages.
const STDERR_TAIL_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// Phase failure
// ---------------------------------------------------------------------------

/// A failure in one phase of the pipeline. Terminates the run.
struct PhaseFailure {
    phase: RunPhase,
    message: String,
    exit_code: Option<i32>,
}

impl PhaseFailure {
    fn new(phase: RunPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            exit_code: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Command construction
// ---------------------------------------------------------------------------

/// Resolve the interpreter binary for a runtime spec.
///
/// An explicit `binary` override wins; otherwise a version pin selects a
/// versioned binary (`python3.11`), falling back to the unversioned default.
pub fn interpreter_binary(runtime: &RuntimeSpec) -> String {
    if let Some(binary) = &runtime.binary {
        return binary.clone();
    }
    match runtime.interpreter {
        Interpreter::Python => match &runtime.version {
            Some(version) => format!("python{version}"),
            None => "python3".to_string(),
        },
        Interpreter::Shell => "bash".to_string(),
    }
}

/// Arguments for installing a Python dependency manifest.
pub fn install_args(manifest: &str) -> Vec<String> {
    vec![
        "-m".to_string(),
        "pip".to_string(),
        "install".to_string(),
        "--disable-pip-version-check".to_string(),
        "-r".to_string(),
        manifest.to_string(),
    ]
}

/// Keep at most the last `max_chars` characters of trimmed subprocess output.
fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        trimmed.to_string()
    } else {
        let tail: String = trimmed.chars().skip(count - max_chars).collect();
        format!("...{tail}")
    }
}

// ---------------------------------------------------------------------------
// JobRunner
// ---------------------------------------------------------------------------

/// Executes job runs through the linear phase pipeline.
///
/// Generic over `R: RunRepository` for storage and `H: ContentHasher` for
/// script digests, pinned to concrete infra implementations at wiring time.
pub struct JobRunner<R, H> {
    repo: Arc<R>,
    secrets: Arc<SecretService>,
    hasher: Arc<H>,
    /// Applied to the invoke phase when the job sets no timeout of its own.
    default_timeout: Option<Duration>,
}

impl<R: RunRepository, H: ContentHasher> JobRunner<R, H> {
    pub fn new(
        repo: Arc<R>,
        secrets: Arc<SecretService>,
        hasher: Arc<H>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            repo,
            secrets,
            hasher,
            default_timeout,
        }
    }

    /// Execute one run of `job` for the given trigger.
    ///
    /// Always returns the finished run record; a failed script or phase is a
    /// normal outcome, not an `Err`. Errors are reserved for the repository.
    pub async fn execute(
        &self,
        job: &JobDefinition,
        ctx: &TriggerContext,
    ) -> Result<JobRun, RepositoryError> {
        let mut run = JobRun {
            id: Uuid::now_v7(),
            job_id: job.id,
            job_name: job.name.clone(),
            status: JobRunStatus::Running,
            trigger_kind: ctx.kind,
            trigger_source: ctx.source.clone(),
            failed_phase: None,
            exit_code: None,
            script_sha256: None,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        };
        self.repo.create_run(&run).await?;

        tracing::info!(
            run_id = %run.id,
            job = job.name.as_str(),
            trigger = %ctx.kind,
            source = ctx.source.as_str(),
            "starting job run"
        );

        match self.run_phases(job, &mut run).await {
            Ok(()) => {
                run.status = JobRunStatus::Succeeded;
                run.exit_code = Some(0);
            }
            Err(failure) => {
                run.status = JobRunStatus::Failed;
                run.failed_phase = Some(failure.phase);
                run.exit_code = failure.exit_code;
                run.error = Some(failure.message);
            }
        }
        run.finished_at = Some(Utc::now());
        self.repo.finish_run(&run).await?;

        match run.status {
            JobRunStatus::Succeeded => {
                tracing::info!(run_id = %run.id, job = job.name.as_str(), "job run succeeded");
            }
            _ => {
                tracing::warn!(
                    run_id = %run.id,
                    job = job.name.as_str(),
                    phase = run.failed_phase.map(|p| p.to_string()).unwrap_or_default(),
                    error = run.error.as_deref().unwrap_or_default(),
                    "job run failed"
                );
            }
        }

        Ok(run)
    }

    /// The four phases, in order. Returns the first failure.
    async fn run_phases(
        &self,
        job: &JobDefinition,
        run: &mut JobRun,
    ) -> Result<(), PhaseFailure> {
        let workspace = self.check_workspace(job, run).await?;
        let binary = self.check_interpreter(job, &workspace).await?;
        self.install_manifest(job, &binary, &workspace).await?;
        self.invoke_script(job, &binary, &workspace).await
    }

    /// Phase 1: the working directory and script file exist. Stamps the run
    /// with the script's content digest.
    async fn check_workspace(
        &self,
        job: &JobDefinition,
        run: &mut JobRun,
    ) -> Result<PathBuf, PhaseFailure> {
        let workspace = job
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        let meta = tokio::fs::metadata(&workspace).await.map_err(|e| {
            PhaseFailure::new(
                RunPhase::Workspace,
                format!("working directory '{}' unavailable: {e}", workspace.display()),
            )
        })?;
        if !meta.is_dir() {
            return Err(PhaseFailure::new(
                RunPhase::Workspace,
                format!("'{}' is not a directory", workspace.display()),
            ));
        }

        let script_path = workspace.join(&job.script);
        let content = tokio::fs::read(&script_path).await.map_err(|e| {
            PhaseFailure::new(
                RunPhase::Workspace,
                format!("script '{}' unavailable: {e}", script_path.display()),
            )
        })?;
        run.script_sha256 = Some(self.hasher.compute_hash(&content));

        Ok(workspace)
    }

    /// Phase 2: the interpreter binary answers a version probe.
    async fn check_interpreter(
        &self,
        job: &JobDefinition,
        workspace: &Path,
    ) -> Result<String, PhaseFailure> {
        let binary = interpreter_binary(&job.runtime);

        let output = Command::new(&binary)
            .arg("--version")
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                PhaseFailure::new(
                    RunPhase::Interpreter,
                    format!("failed to spawn interpreter '{binary}': {e}"),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PhaseFailure::new(
                RunPhase::Interpreter,
                format!(
                    "interpreter '{binary}' version probe exited with {}: {}",
                    output.status,
                    tail(&stderr, STDERR_TAIL_CHARS)
                ),
            ));
        }

        // Version strings land on stdout for python3 and bash alike.
        let version = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(
            job = job.name.as_str(),
            binary = binary.as_str(),
            version = version.lines().next().unwrap_or_default(),
            "interpreter ready"
        );

        Ok(binary)
    }

    /// Phase 3: install the dependency manifest, if one is declared.
    async fn install_manifest(
        &self,
        job: &JobDefinition,
        binary: &str,
        workspace: &Path,
    ) -> Result<(), PhaseFailure> {
        let Some(manifest) = &job.runtime.manifest else {
            tracing::debug!(job = job.name.as_str(), "no dependency manifest declared");
            return Ok(());
        };

        tracing::info!(
            job = job.name.as_str(),
            manifest = manifest.as_str(),
            "installing dependencies"
        );

        let output = Command::new(binary)
            .args(install_args(manifest))
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                PhaseFailure::new(
                    RunPhase::Install,
                    format!("failed to spawn dependency install: {e}"),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PhaseFailure::new(
                RunPhase::Install,
                format!(
                    "dependency install exited with {}: {}",
                    output.status,
                    tail(&stderr, STDERR_TAIL_CHARS)
                ),
            ));
        }

        Ok(())
    }

    /// Phase 4: resolve env bindings and invoke the script.
    async fn invoke_script(
        &self,
        job: &JobDefinition,
        binary: &str,
        workspace: &Path,
    ) -> Result<(), PhaseFailure> {
        // Resolve every binding before spawning; a missing secret fails the
        // run without invoking the script, and its value is never logged.
        let scope = SecretScope::Job(job.name.clone());
        let mut env = Vec::with_capacity(job.env.len());
        for (var, key) in &job.env {
            let value = self
                .secrets
                .get_secret(key, &scope)
                .await
                .map_err(|e| {
                    PhaseFailure::new(RunPhase::Invoke, format!("secret lookup failed: {e}"))
                })?
                .ok_or_else(|| {
                    PhaseFailure::new(
                        RunPhase::Invoke,
                        format!("secret '{key}' for variable '{var}' not found"),
                    )
                })?;
            env.push((var.clone(), value));
        }

        let mut command = Command::new(binary);
        command
            .arg(&job.script)
            .envs(env)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!(
            job = job.name.as_str(),
            script = job.script.as_str(),
            "invoking script"
        );

        let child = command.spawn().map_err(|e| {
            PhaseFailure::new(
                RunPhase::Invoke,
                format!("failed to spawn '{binary} {}': {e}", job.script),
            )
        })?;

        let timeout = job
            .timeout_secs
            .map(Duration::from_secs)
            .or(self.default_timeout);

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    PhaseFailure::new(
                        RunPhase::Invoke,
                        format!("script timed out after {}s", limit.as_secs()),
                    )
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| {
            PhaseFailure::new(RunPhase::Invoke, format!("failed to wait for script: {e}"))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines() {
            tracing::info!(target: "cadence::script", job = job.name.as_str(), "{line}");
        }
        for line in stderr.lines() {
            tracing::warn!(target: "cadence::script", job = job.name.as_str(), "{line}");
        }

        match output.status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(PhaseFailure {
                phase: RunPhase::Invoke,
                message: format!(
                    "script exited with status {code}: {}",
                    tail(&stderr, STDERR_TAIL_CHARS)
                ),
                exit_code: Some(code),
            }),
            None => Err(PhaseFailure::new(
                RunPhase::Invoke,
                "script terminated by signal",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
