//! Job commands: list, show, validate.

use std::path::Path;

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use cadence_core::job::definition::parse_job_yaml;
use cadence_core::schedule::next_occurrence;
use cadence_types::job::{JobDefinition, TriggerConfig};

use crate::state::AppState;

/// Summarize a job's triggers as a short human string.
fn trigger_summary(job: &JobDefinition) -> String {
    let mut parts = Vec::new();
    for trigger in &job.triggers {
        match trigger {
            TriggerConfig::Cron { schedule } => parts.push(format!("cron({schedule})")),
            TriggerConfig::Manual {} => parts.push("manual".to_string()),
        }
    }
    parts.join(", ")
}

/// The next cron fire time across all of a job's schedules.
fn next_fire(job: &JobDefinition) -> Option<chrono::DateTime<chrono::Utc>> {
    job.triggers
        .iter()
        .filter_map(|t| match t {
            TriggerConfig::Cron { schedule } => next_occurrence(schedule),
            TriggerConfig::Manual {} => None,
        })
        .min()
}

/// List all jobs in the jobs directory.
pub async fn list_jobs(state: &AppState, json: bool) -> Result<()> {
    let registry = state.load_registry().await?;

    if json {
        let jobs: Vec<&JobDefinition> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!();
        println!(
            "  {} No jobs in {}. Add a job YAML file to get started.",
            style("i").blue().bold(),
            style(state.jobs_dir.display()).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Triggers").fg(Color::White),
        Cell::new("Runtime").fg(Color::White),
        Cell::new("Script").fg(Color::White),
        Cell::new("Next fire (UTC)").fg(Color::White),
    ]);

    for job in registry.iter() {
        let runtime = match &job.runtime.version {
            Some(v) => format!("{} {v}", job.runtime.interpreter),
            None => job.runtime.interpreter.to_string(),
        };
        table.add_row(vec![
            Cell::new(&job.name).fg(Color::Cyan),
            Cell::new(trigger_summary(job)),
            Cell::new(runtime),
            Cell::new(&job.script),
            Cell::new(
                next_fire(job)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
            .fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Show details of a single job.
pub async fn show_job(state: &AppState, job_name: &str, json: bool) -> Result<()> {
    let registry = state.load_registry().await?;
    let job = registry.get(job_name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(job)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Job").bold(), style(&job.name).cyan().bold());
    if let Some(description) = &job.description {
        println!("  {description}");
    }
    println!();
    println!("  Triggers:    {}", trigger_summary(job));
    if let Some(next) = next_fire(job) {
        println!(
            "  Next fire:   {} UTC",
            style(next.format("%Y-%m-%d %H:%M:%S")).bold()
        );
    }
    println!(
        "  Runtime:     {}{}",
        job.runtime.interpreter,
        job.runtime
            .version
            .as_deref()
            .map(|v| format!(" {v}"))
            .unwrap_or_default()
    );
    if let Some(manifest) = &job.runtime.manifest {
        println!("  Manifest:    {manifest}");
    }
    println!("  Script:      {}", job.script);
    if let Some(dir) = &job.working_dir {
        println!("  Working dir: {}", dir.display());
    }
    if !job.env.is_empty() {
        println!("  Environment:");
        for (var, key) in &job.env {
            println!("    {var} <- secret {}", style(key).dim());
        }
    }
    if let Some(timeout) = job.timeout_secs {
        println!("  Timeout:     {timeout}s");
    }
    println!();

    Ok(())
}

/// Validate a job file without touching the registry.
pub async fn validate_file(path: &Path, json: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(path).await?;

    match parse_job_yaml(&content) {
        Ok(job) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({"valid": true, "name": job.name})
                );
            } else {
                println!(
                    "  {} {} is a valid job ('{}')",
                    style("✓").green().bold(),
                    style(path.display()).bold(),
                    job.name
                );
            }
            Ok(())
        }
        Err(err) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({"valid": false, "error": err.to_string()})
                );
            } else {
                println!(
                    "  {} {}: {}",
                    style("✗").red().bold(),
                    style(path.display()).bold(),
                    err
                );
            }
            anyhow::bail!("invalid job file");
        }
    }
}
