//! Global configuration types for Cadence.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! the jobs directory, missed-run catch-up, and run retention.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Cadence runner.
///
/// Loaded from `~/.cadence/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Directory containing job YAML files. Relative paths are resolved
    /// against the data directory. Defaults to "jobs".
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: String,

    /// Dispatch one catch-up run per job on daemon start when cron ticks
    /// were missed while the daemon was down. Off by default, matching a
    /// host scheduler that silently skips missed ticks.
    #[serde(default)]
    pub catch_up: bool,

    /// How many run records to retain per job. Older records are pruned
    /// after each finished run.
    #[serde(default = "default_keep_runs")]
    pub keep_runs: u32,

    /// Default invoke-phase timeout in seconds applied when a job does not
    /// set its own. None means runs are unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_secs: Option<u64>,
}

fn default_jobs_dir() -> String {
    "jobs".to_string()
}

fn default_keep_runs() -> u32 {
    500
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            jobs_dir: default_jobs_dir(),
            catch_up: false,
            keep_runs: default_keep_runs(),
            default_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.jobs_dir, "jobs");
        assert!(!config.catch_up);
        assert_eq!(config.keep_runs, 500);
        assert!(config.default_timeout_secs.is_none());
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let toml_str = "";
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.jobs_dir, "jobs");
        assert_eq!(config.keep_runs, 500);
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
jobs_dir = "/srv/cadence/jobs"
catch_up = true
keep_runs = 100
default_timeout_secs = 1800
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.jobs_dir, "/srv/cadence/jobs");
        assert!(config.catch_up);
        assert_eq!(config.keep_runs, 100);
        assert_eq!(config.default_timeout_secs, Some(1800));
    }

    #[test]
    fn test_global_config_serde_roundtrip() {
        let config = GlobalConfig {
            jobs_dir: "jobs".to_string(),
            catch_up: true,
            keep_runs: 50,
            default_timeout_secs: Some(600),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GlobalConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.catch_up);
        assert_eq!(parsed.keep_runs, 50);
        assert_eq!(parsed.default_timeout_secs, Some(600));
    }
}
