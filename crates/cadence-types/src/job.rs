//! Job domain types for Cadence.
//!
//! Defines the canonical representation of a job: a YAML file on disk parses
//! into `JobDefinition`, which is the single source of truth for what gets
//! invoked, on which triggers, and with which environment bindings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// UUIDv7 identifier assigned to a job when it is first loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a new time-sortable id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Job Definition
// ---------------------------------------------------------------------------

/// The canonical job definition.
///
/// Loaded from a YAML file in the jobs directory. Describes what script to
/// invoke, when, and with which secret-backed environment bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    /// UUIDv7 assigned on load (not present in the YAML file).
    #[serde(default = "JobId::new")]
    pub id: JobId,
    /// Job name, unique across the jobs directory.
    pub name: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Trigger configurations (cron and/or manual).
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
    /// Interpreter and dependency manifest for the script.
    pub runtime: RuntimeSpec,
    /// Script path, relative to `working_dir`.
    pub script: String,
    /// Working directory for all subprocesses. When absent, the directory
    /// containing the job file is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Environment bindings: variable name -> secret key. Only these
    /// variables are added to the child environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Optional invoke-phase timeout in seconds. Absent means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Interpreter and dependency setup for a job's script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSpec {
    /// Which interpreter runs the script.
    pub interpreter: Interpreter,
    /// Optional version pin (e.g. "3.11"). Selects a versioned binary such
    /// as `python3.11` when no explicit `binary` override is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Explicit interpreter binary override (absolute path or a name on
    /// PATH). Takes precedence over `version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    /// Dependency manifest installed before the script runs (e.g.
    /// "requirements.txt"), relative to the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
}

/// The interpreter kind for a job script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpreter {
    Python,
    Shell,
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpreter::Python => write!(f, "python"),
            Interpreter::Shell => write!(f, "shell"),
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger Configuration
// ---------------------------------------------------------------------------

/// How a job can be triggered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    /// Triggered on explicit operator request via the CLI.
    Manual {},
    /// Cron schedule trigger, evaluated in UTC.
    Cron {
        /// Cron expression or human-readable schedule string.
        schedule: String,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
