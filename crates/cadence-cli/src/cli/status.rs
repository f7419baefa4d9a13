//! The `cadence status` command: jobs, recent runs, storage locations.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use cadence_core::repository::run::RunRepository;
use cadence_types::run::JobRunStatus;

use crate::state::AppState;

/// Print a daemon-independent overview of the installation.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let registry = state.load_registry().await?;
    let recent = state.run_repo.list_recent(10).await?;

    if json {
        let payload = serde_json::json!({
            "data_dir": state.data_dir.display().to_string(),
            "jobs_dir": state.jobs_dir.display().to_string(),
            "jobs": registry.names(),
            "recent_runs": recent,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!();
    println!("  {} Cadence status", style("⏱").bold());
    println!();
    println!("  Data dir:  {}", style(state.data_dir.display()).cyan());
    println!("  Jobs dir:  {}", style(state.jobs_dir.display()).cyan());
    println!(
        "  Jobs:      {}",
        if registry.is_empty() {
            style("none".to_string()).dim()
        } else {
            style(registry.names().join(", ")).bold()
        }
    );
    println!();

    if recent.is_empty() {
        println!("  {} No runs recorded yet", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Job").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Trigger").fg(Color::White),
    ]);

    for run in &recent {
        let status_cell = match run.status {
            JobRunStatus::Succeeded => Cell::new("succeeded").fg(Color::Green),
            JobRunStatus::Failed => Cell::new("failed").fg(Color::Red),
            JobRunStatus::Running => Cell::new("running").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&run.job_name).fg(Color::Cyan),
            Cell::new(run.started_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            status_cell,
            Cell::new(run.trigger_kind.to_string()),
        ]);
    }

    println!("{table}");
    println!();

    Ok(())
}
