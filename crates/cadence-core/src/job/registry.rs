//! Job discovery: load every job file from the jobs directory.
//!
//! The registry is rebuilt from disk on every daemon start and CLI
//! invocation; there is no in-memory mutation. Each job's working directory
//! defaults to the directory containing its file, so scripts and manifests
//! can live next to the definition.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cadence_types::error::JobError;
use cadence_types::job::JobDefinition;

use super::definition::parse_job_yaml;

/// In-memory registry of validated job definitions, keyed by name.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: HashMap<String, JobDefinition>,
}

impl JobRegistry {
    /// Load all `*.yaml` / `*.yml` files from `jobs_dir`.
    ///
    /// A missing directory yields an empty registry (the operator simply has
    /// no jobs yet). Duplicate job names across files are an error. Each
    /// loaded job's `working_dir` is resolved: an absolute path is kept, a
    /// relative path is joined to the job file's directory, and an absent
    /// one defaults to the job file's directory.
    pub async fn load(jobs_dir: &Path) -> Result<Self, JobError> {
        let mut jobs = HashMap::new();

        let mut entries = match tokio::fs::read_dir(jobs_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %jobs_dir.display(), "jobs directory does not exist");
                return Ok(Self { jobs });
            }
            Err(err) => return Err(JobError::IoError(err)),
        };

        let mut files: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                files.push(path);
            }
        }
        // Deterministic load order regardless of directory iteration order.
        files.sort();

        for path in files {
            let content = tokio::fs::read_to_string(&path).await?;
            let mut job = parse_job_yaml(&content).map_err(|e| match e {
                JobError::ParseError(msg) => {
                    JobError::ParseError(format!("{}: {msg}", path.display()))
                }
                JobError::ValidationError(msg) => {
                    JobError::ValidationError(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?;

            let file_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            job.working_dir = Some(match job.working_dir.take() {
                Some(dir) if dir.is_absolute() => dir,
                Some(dir) => file_dir.join(dir),
                None => file_dir,
            });

            if jobs.contains_key(&job.name) {
                return Err(JobError::NameConflict(job.name));
            }

            tracing::debug!(job = job.name.as_str(), file = %path.display(), "loaded job");
            jobs.insert(job.name.clone(), job);
        }

        Ok(Self { jobs })
    }

    /// Get a job by name.
    pub fn get(&self, name: &str) -> Result<&JobDefinition, JobError> {
        self.jobs
            .get(name)
            .ok_or_else(|| JobError::NotFound(name.to_string()))
    }

    /// Iterate all jobs in name order.
    pub fn iter(&self) -> impl Iterator<Item = &JobDefinition> {
        let mut names: Vec<&String> = self.jobs.keys().collect();
        names.sort();
        names.into_iter().map(|n| &self.jobs[n])
    }

    /// All job names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const COMMUTE_END: &str = r#"
name: commute-end
triggers:
  - type: cron
    schedule: "0 * * * *"
  - type: manual
runtime:
  interpreter: python
  manifest: requirements.txt
script: commute_end.py
env:
  KURLY_LOGIN_ID: KURLY_LOGIN_ID
  KURLY_PASSWORD: KURLY_PASSWORD
  GOOGLE_CREDENTIALS_JSON: GOOGLE_CREDENTIALS_JSON
"#;

    const NIGHTLY: &str = r#"
name: nightly-report
triggers:
  - type: cron
    schedule: daily
runtime:
  interpreter: shell
script: report.sh
"#;

    #[tokio::test]
    async fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("commute_end.yaml"), COMMUTE_END)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("nightly.yml"), NIGHTLY)
            .await
            .unwrap();
        // Non-YAML files are ignored.
        tokio::fs::write(dir.path().join("README.md"), "# jobs")
            .await
            .unwrap();

        let registry = JobRegistry::load(dir.path()).await.unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["commute-end", "nightly-report"]);

        let job = registry.get("commute-end").unwrap();
        assert_eq!(job.env.len(), 3);
        // Working dir defaults to the directory containing the job file.
        assert_eq!(job.working_dir.as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_load_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JobRegistry::load(&dir.path().join("nope")).await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.yaml"), COMMUTE_END)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("b.yaml"), COMMUTE_END)
            .await
            .unwrap();

        let result = JobRegistry::load(dir.path()).await;
        assert!(matches!(result, Err(JobError::NameConflict(_))));
    }

    #[tokio::test]
    async fn test_invalid_job_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("broken.yaml"), "name: [not a job")
            .await
            .unwrap();

        let err = JobRegistry::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[tokio::test]
    async fn test_relative_working_dir_resolved_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r#"
name: scoped
triggers:
  - type: manual
runtime:
  interpreter: shell
script: run.sh
working_dir: scripts
"#;
        tokio::fs::write(dir.path().join("scoped.yaml"), yaml)
            .await
            .unwrap();

        let registry = JobRegistry::load(dir.path()).await.unwrap();
        let job = registry.get("scoped").unwrap();
        assert_eq!(job.working_dir.as_deref(), Some(dir.path().join("scripts").as_path()));
    }

    #[tokio::test]
    async fn test_get_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JobRegistry::load(dir.path()).await.unwrap();
        assert!(matches!(
            registry.get("ghost"),
            Err(JobError::NotFound(_))
        ));
    }
}
