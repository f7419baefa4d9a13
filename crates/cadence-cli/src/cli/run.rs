//! Run commands: manual dispatch and run history.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::ProgressBar;

use cadence_types::run::{JobRun, JobRunStatus};

use crate::state::AppState;

/// Manually trigger a job and report the outcome.
///
/// # Examples
///
/// ```bash
/// cadence run commute-end
/// cadence run commute-end --json
/// ```
pub async fn run_job(state: &AppState, job_name: &str, json: bool) -> Result<()> {
    let dispatcher = state.dispatcher(&state.config).await?;

    let spinner = if json {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_message(format!("Running '{job_name}'"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    };

    let result = dispatcher.dispatch_manual(job_name).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let run = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    match run.status {
        JobRunStatus::Succeeded => {
            println!(
                "  {} '{}' succeeded in {} (run {})",
                style("✓").green().bold(),
                style(job_name).bold(),
                duration_display(&run),
                style(run.id).dim(),
            );
        }
        _ => {
            println!(
                "  {} '{}' failed at {} phase: {}",
                style("✗").red().bold(),
                style(job_name).bold(),
                style(
                    run.failed_phase
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                )
                .yellow(),
                run.error.as_deref().unwrap_or("no error recorded"),
            );
            anyhow::bail!("run {} failed", run.id);
        }
    }

    Ok(())
}

/// List recent runs of a job, newest first.
pub async fn list_runs(state: &AppState, job_name: &str, limit: u32, json: bool) -> Result<()> {
    use cadence_core::repository::run::RunRepository;

    let runs = state.run_repo.list_runs(job_name, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!();
        println!(
            "  {} No runs recorded for '{}'",
            style("i").blue().bold(),
            style(job_name).bold()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Started").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Trigger").fg(Color::White),
        Cell::new("Duration").fg(Color::White),
        Cell::new("Exit").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for run in &runs {
        let status_cell = match run.status {
            JobRunStatus::Succeeded => Cell::new("succeeded").fg(Color::Green),
            JobRunStatus::Failed => Cell::new("failed").fg(Color::Red),
            JobRunStatus::Running => Cell::new("running").fg(Color::Yellow),
        };

        table.add_row(vec![
            Cell::new(run.started_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            status_cell,
            Cell::new(run.trigger_kind.to_string()),
            Cell::new(duration_display(run)),
            Cell::new(
                run.exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(run.error.as_deref().unwrap_or("")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} run{} of '{}'",
        style(runs.len()).bold(),
        if runs.len() == 1 { "" } else { "s" },
        style(job_name).bold()
    );
    println!();

    Ok(())
}

fn duration_display(run: &JobRun) -> String {
    match run.finished_at {
        Some(finished) => {
            let secs = (finished - run.started_at).num_milliseconds() as f64 / 1000.0;
            format!("{secs:.1}s")
        }
        None => "-".to_string(),
    }
}
