//! Global configuration loader for Cadence.
//!
//! Reads `config.toml` from the data directory (`~/.cadence/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::{Path, PathBuf};

use cadence_types::config::GlobalConfig;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the jobs directory from the config.
///
/// An absolute `jobs_dir` is used as-is; a relative one is joined to the
/// data directory.
pub fn resolve_jobs_dir(data_dir: &Path, config: &GlobalConfig) -> PathBuf {
    let configured = Path::new(&config.jobs_dir);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        data_dir.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.jobs_dir, "jobs");
        assert!(!config.catch_up);
        assert_eq!(config.keep_runs, 500);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
jobs_dir = "/srv/jobs"
catch_up = true
keep_runs = 50
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.jobs_dir, "/srv/jobs");
        assert!(config.catch_up);
        assert_eq!(config.keep_runs, 50);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.jobs_dir, "jobs");
        assert_eq!(config.keep_runs, 500);
    }

    #[test]
    fn resolve_jobs_dir_relative_joins_data_dir() {
        let config = GlobalConfig::default();
        let dir = resolve_jobs_dir(Path::new("/home/op/.cadence"), &config);
        assert_eq!(dir, PathBuf::from("/home/op/.cadence/jobs"));
    }

    #[test]
    fn resolve_jobs_dir_absolute_used_as_is() {
        let config = GlobalConfig {
            jobs_dir: "/srv/cadence/jobs".to_string(),
            ..GlobalConfig::default()
        };
        let dir = resolve_jobs_dir(Path::new("/home/op/.cadence"), &config);
        assert_eq!(dir, PathBuf::from("/srv/cadence/jobs"));
    }
}
