//! The `cadence daemon` command: schedule every cron job and run until
//! SIGINT/SIGTERM.

use anyhow::Result;
use console::style;
use std::sync::Arc;

use crate::state::AppState;

/// Start the scheduler daemon.
///
/// Loads the registry, schedules all cron triggers, optionally catches up
/// missed schedules, then parks until a shutdown signal arrives. In-flight
/// runs complete before the process exits.
pub async fn daemon(state: &AppState, catch_up_flag: bool) -> Result<()> {
    let mut config = state.config.clone();
    if catch_up_flag {
        config.catch_up = true;
    }

    let dispatcher = Arc::new(state.dispatcher(&config).await?);

    let job_count = dispatcher.registry().len();
    if job_count == 0 {
        println!(
            "  {} No jobs found in {}",
            style("i").blue().bold(),
            style(state.jobs_dir.display()).cyan()
        );
        return Ok(());
    }

    let scheduled = dispatcher.start().await?;

    println!(
        "  {} Cadence daemon: {} job{}, {} cron entr{}",
        style("⏱").bold(),
        style(job_count).bold(),
        if job_count == 1 { "" } else { "s" },
        style(scheduled).bold(),
        if scheduled == 1 { "y" } else { "ies" },
    );
    println!("  {}", style("Press Ctrl+C to stop").dim());

    shutdown_signal().await;

    tracing::info!("shutdown signal received");
    dispatcher.stop().await?;

    let active = dispatcher.active_runs();
    if !active.is_empty() {
        println!(
            "  {} Waiting for {} active run{} to finish",
            style("…").dim(),
            active.len(),
            if active.len() == 1 { "" } else { "s" }
        );
        while !dispatcher.active_runs().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
    }

    println!("\n  Daemon stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
