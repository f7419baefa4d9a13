//! Cadence CLI entry point.
//!
//! Binary name: `cadence`
//!
//! Parses CLI arguments, initializes the database and services, then
//! dispatches to the appropriate command handler or starts the scheduler
//! daemon.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, DeleteResource, ListResource, SetResource};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state or tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "cadence", &mut std::io::stdout());
        return Ok(());
    }

    // The daemon gets the full structured setup (optionally bridged to
    // OpenTelemetry); one-shot commands get a verbosity-based filter.
    if let Commands::Daemon { otel, .. } = &cli.command {
        cadence_observe::tracing_setup::init_tracing(*otel)
            .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
    } else {
        let filter = match cli.verbose {
            0 if cli.quiet => "error",
            0 => "warn,cadence::script=info",
            1 => "info,cadence=debug",
            _ => "trace",
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(false)
            .init();
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Run { job } => {
            cli::run::run_job(&state, &job, cli.json).await?;
        }

        Commands::Daemon { catch_up, .. } => {
            cli::daemon::daemon(&state, catch_up).await?;
        }

        Commands::List { resource } => match resource {
            ListResource::Jobs => {
                cli::job::list_jobs(&state, cli.json).await?;
            }
            ListResource::Runs { job, limit } => {
                cli::run::list_runs(&state, &job, limit, cli.json).await?;
            }
            ListResource::Secrets => {
                cli::secret::list_secrets(&state, cli.json).await?;
            }
        },

        Commands::Show { job } => {
            cli::job::show_job(&state, &job, cli.json).await?;
        }

        Commands::Validate { file } => {
            cli::job::validate_file(&file, cli.json).await?;
        }

        Commands::Set { resource } => match resource {
            SetResource::Secret { key, value, job } => {
                cli::secret::set_secret(&state, &key, value.as_deref(), job.as_deref(), cli.json)
                    .await?;
            }
        },

        Commands::Delete { resource } => match resource {
            DeleteResource::Secret { key, job } => {
                cli::secret::delete_secret(&state, &key, job.as_deref(), cli.json).await?;
            }
        },

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    // Flush any pending OTel spans before exit (no-op when disabled).
    cadence_observe::tracing_setup::shutdown_tracing();

    Ok(())
}
