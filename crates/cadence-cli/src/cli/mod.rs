//! CLI command definitions and dispatch for the `cadence` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a verb-noun
//! pattern (e.g., `cadence run commute-end`, `cadence list jobs`).

pub mod daemon;
pub mod job;
pub mod run;
pub mod secret;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Run scheduled jobs with secret-backed environments.
#[derive(Parser)]
#[command(name = "cadence", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a job now (manual trigger).
    Run {
        /// Name of the job to run.
        job: String,
    },

    /// Start the scheduler daemon (runs until SIGINT/SIGTERM).
    Daemon {
        /// Bridge tracing spans to OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,

        /// Dispatch catch-up runs for schedules missed while the daemon was
        /// down, overriding the config.
        #[arg(long)]
        catch_up: bool,
    },

    /// List resources.
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show details of a job.
    Show {
        /// Job name to display.
        job: String,
    },

    /// Validate a job file without loading the registry.
    Validate {
        /// Path to the job YAML file.
        file: PathBuf,
    },

    /// Set a secret value.
    Set {
        #[command(subcommand)]
        resource: SetResource,
    },

    /// Delete a resource.
    #[command(alias = "rm")]
    Delete {
        #[command(subcommand)]
        resource: DeleteResource,
    },

    /// Show daemon-independent status: jobs, recent runs, storage.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// List all jobs in the jobs directory.
    Jobs,

    /// List recent runs of a job.
    Runs {
        /// Job name.
        job: String,

        /// Maximum number of runs to show.
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// List stored secrets (masked).
    Secrets,
}

#[derive(Subcommand)]
pub enum SetResource {
    /// Set a secret value (prompts when --value is omitted).
    Secret {
        /// Secret key (e.g., KURLY_PASSWORD).
        key: String,

        /// Value; omit to enter interactively with hidden input.
        #[arg(long)]
        value: Option<String>,

        /// Scope the secret to a single job instead of globally.
        #[arg(long)]
        job: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DeleteResource {
    /// Delete a stored secret.
    Secret {
        /// Secret key.
        key: String,

        /// Job scope (global when omitted).
        #[arg(long)]
        job: Option<String>,
    },
}
