//! Job definition parsing and validation.
//!
//! Converts between YAML files and the canonical `JobDefinition`, and
//! validates structural constraints (name format, trigger presence, env
//! binding names, runtime coherence).

use cadence_types::error::JobError;
use cadence_types::job::{Interpreter, JobDefinition};

/// Parse a YAML string into a validated `JobDefinition`.
///
/// Runs `validate_definition` after deserialization, so the returned value
/// is guaranteed to be structurally valid.
pub fn parse_job_yaml(yaml: &str) -> Result<JobDefinition, JobError> {
    let def: JobDefinition =
        serde_yaml_ng::from_str(yaml).map_err(|e| JobError::ParseError(e.to_string()))?;
    validate_definition(&def)?;
    Ok(def)
}

/// Serialize a `JobDefinition` to a YAML string.
pub fn serialize_job_yaml(def: &JobDefinition) -> Result<String, JobError> {
    serde_yaml_ng::to_string(def).map_err(|e| JobError::ParseError(e.to_string()))
}

/// Validate structural constraints on a `JobDefinition`.
///
/// Checks:
/// - Name is non-empty, lowercase alphanumeric plus hyphens
/// - At least one trigger is declared
/// - Cron schedules normalize to valid expressions
/// - Script path is non-empty and relative
/// - Env variable names are valid POSIX identifiers with non-empty keys
/// - A dependency manifest is only valid for Python runtimes
/// - Timeout > 0 if set
pub fn validate_definition(def: &JobDefinition) -> Result<(), JobError> {
    if def.name.is_empty() {
        return Err(JobError::ValidationError(
            "job name must not be empty".to_string(),
        ));
    }
    if !def
        .name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(JobError::ValidationError(format!(
            "job name '{}' must contain only lowercase letters, digits, and hyphens",
            def.name
        )));
    }

    if def.triggers.is_empty() {
        return Err(JobError::ValidationError(format!(
            "job '{}' declares no triggers and could never run",
            def.name
        )));
    }

    for trigger in &def.triggers {
        if let cadence_types::job::TriggerConfig::Cron { schedule } = trigger {
            crate::schedule::normalize_schedule(schedule).map_err(|e| {
                JobError::ValidationError(format!("invalid cron schedule '{schedule}': {e}"))
            })?;
        }
    }

    if def.script.is_empty() {
        return Err(JobError::ValidationError(
            "script path must not be empty".to_string(),
        ));
    }
    if std::path::Path::new(&def.script).is_absolute() {
        return Err(JobError::ValidationError(format!(
            "script path '{}' must be relative to the working directory",
            def.script
        )));
    }

    for (var, key) in &def.env {
        if !is_valid_env_var(var) {
            return Err(JobError::ValidationError(format!(
                "invalid environment variable name '{var}'"
            )));
        }
        if key.is_empty() {
            return Err(JobError::ValidationError(format!(
                "environment variable '{var}' maps to an empty secret key"
            )));
        }
    }

    if def.runtime.manifest.is_some() && def.runtime.interpreter != Interpreter::Python {
        return Err(JobError::ValidationError(format!(
            "job '{}' declares a dependency manifest but its interpreter is '{}'",
            def.name, def.runtime.interpreter
        )));
    }

    if def.timeout_secs == Some(0) {
        return Err(JobError::ValidationError(
            "timeout_secs must be greater than zero when set".to_string(),
        ));
    }

    Ok(())
}

/// POSIX-ish env var name: starts with a letter or underscore, continues
/// with letters, digits, or underscores.
fn is_valid_env_var(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
