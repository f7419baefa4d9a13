//! Secret management CLI commands: set, list, delete.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Password;

use cadence_core::service::secret::SecretService;
use cadence_types::secret::SecretScope;

use crate::state::AppState;

fn scope_for(job: Option<&str>) -> SecretScope {
    match job {
        Some(name) => SecretScope::Job(name.to_string()),
        None => SecretScope::Global,
    }
}

/// Set a secret value with hidden input prompt.
///
/// # Examples
///
/// ```bash
/// # Secure prompt (recommended)
/// cadence set secret KURLY_PASSWORD
///
/// # Script/automation mode
/// cadence set secret KURLY_PASSWORD --value hunter2
///
/// # Scoped to one job
/// cadence set secret KURLY_PASSWORD --job commute-end
/// ```
pub async fn set_secret(
    state: &AppState,
    key: &str,
    value: Option<&str>,
    job: Option<&str>,
    json: bool,
) -> Result<()> {
    let secret_value = match value {
        Some(v) => v.to_string(),
        None => Password::new()
            .with_prompt(format!("Enter value for {}", style(key).bold()))
            .interact()?,
    };

    let scope = scope_for(job);
    state
        .secret_service
        .set_secret(key, &secret_value, &scope)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "set": true,
                "key": key,
                "scope": scope.to_string(),
                "masked": SecretService::mask_secret(&secret_value),
            })
        );
    } else {
        println!(
            "  {} Secret '{}' set for {} scope ({})",
            style("✓").green().bold(),
            style(key).bold(),
            scope,
            SecretService::mask_secret(&secret_value)
        );
    }

    Ok(())
}

/// List all secrets with masked values.
pub async fn list_secrets(state: &AppState, json: bool) -> Result<()> {
    let entries = state
        .secret_service
        .list_secrets(&SecretScope::Global)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!(
            "  {} No secrets stored. Add one with: {}",
            style("i").blue().bold(),
            style("cadence set secret KURLY_PASSWORD").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Backend").fg(Color::White),
        Cell::new("Scope").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for entry in &entries {
        // Fetch the value only to mask it
        let masked = match state
            .secret_service
            .get_secret(&entry.key.0, &SecretScope::Global)
            .await
        {
            Ok(Some(val)) => SecretService::mask_secret(&val),
            _ => "****".to_string(),
        };

        table.add_row(vec![
            Cell::new(format!("{}: {}", entry.key, masked)).fg(Color::Cyan),
            Cell::new(entry.backend.to_string()),
            Cell::new(entry.scope.to_string()),
            Cell::new(entry.updated_at.format("%Y-%m-%d").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} secret{}",
        style(entries.len()).bold(),
        if entries.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Delete a stored secret.
pub async fn delete_secret(
    state: &AppState,
    key: &str,
    job: Option<&str>,
    json: bool,
) -> Result<()> {
    let scope = scope_for(job);
    state.secret_service.delete_secret(key, &scope).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "key": key, "scope": scope.to_string()})
        );
    } else {
        println!(
            "  {} Secret '{}' deleted from {} scope",
            style("✓").green().bold(),
            style(key).bold(),
            scope
        );
    }

    Ok(())
}
