//! Administrative commands: allow-list, punishment mode, quarantine, audit.

use super::{
    AllowlistCommands, AuditCommands, Cli, Connection, OutputFormat, PunishmentCommands,
    QuarantineCommands,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;
use warden_discord::Http;
use warden_error::WardenResult;
use warden_guard::GuardController;
use warden_interface::{AllowListEntry, AuditEvent};

async fn controller(cli: &Cli) -> WardenResult<GuardController> {
    let connection = Connection::open(cli).await?;
    let http = Arc::new(Http::new(&connection.token));
    let services = connection.services(http).await?;
    Ok(GuardController::new(&services))
}

fn print_entries(entries: &[AllowListEntry], format: OutputFormat) -> WardenResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(entries)?),
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("Allow-list is empty");
            }
            for entry in entries {
                let granted_by = entry
                    .granted_by
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let last_seen = entry
                    .last_seen_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<20} granted {} by {:<20} last seen {}",
                    entry.subject_id.to_string(),
                    entry.granted_at.format("%Y-%m-%d %H:%M"),
                    granted_by,
                    last_seen
                );
            }
        }
    }
    Ok(())
}

fn print_events(events: &[AuditEvent], format: OutputFormat) -> WardenResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(events)?),
        OutputFormat::Human => {
            for event in events {
                let executor = event
                    .executor_id()
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} {:<28} {:<14} executor {:<20} {}",
                    event.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    event.action(),
                    event.source().to_string(),
                    executor,
                    event.summary().unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> WardenResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        warden_error::ConfigError::new(format!("Failed to serialize output: {e}")).into()
    })
}

/// Handle `warden allowlist ...`.
#[instrument(skip(cli))]
pub async fn handle_allowlist_command(cli: &Cli, command: &AllowlistCommands) -> WardenResult<()> {
    let controller = controller(cli).await?;
    match command {
        AllowlistCommands::Add { user, granted_by } => {
            let entry = controller.allow_list().grant(*user, *granted_by).await?;
            println!("Allow-listed {} (granted by {})", entry.subject_id, granted_by);
        }
        AllowlistCommands::Remove { user, revoked_by } => {
            controller.allow_list().revoke(*user, *revoked_by).await?;
            println!("Removed {} from the allow-list", user);
        }
        AllowlistCommands::List { format } => {
            let entries = controller.allow_list().list().await?;
            print_entries(&entries, *format)?;
        }
    }
    Ok(())
}

/// Handle `warden punishment ...`.
#[instrument(skip(cli))]
pub async fn handle_punishment_command(
    cli: &Cli,
    command: &PunishmentCommands,
) -> WardenResult<()> {
    match command {
        PunishmentCommands::Show => {
            // Reads the layered configuration only; no connection needed.
            let config = warden_guard::ConfigHandle::load(cli.config.clone())?;
            println!("{}", config.punishment_type());
        }
        PunishmentCommands::Set { kind, changed_by } => {
            let controller = controller(cli).await?;
            let previous = controller.set_punishment_type(*kind, *changed_by).await?;
            println!("Punishment type changed: {} -> {}", previous, kind);
        }
    }
    Ok(())
}

/// Handle `warden quarantine ...`.
#[instrument(skip(cli))]
pub async fn handle_quarantine_command(
    cli: &Cli,
    command: &QuarantineCommands,
) -> WardenResult<()> {
    match command {
        QuarantineCommands::Release { user, released_by } => {
            let controller = controller(cli).await?;
            controller.release_quarantine(*user, *released_by).await?;
            println!("Released {} from quarantine", user);
        }
    }
    Ok(())
}

/// Handle `warden audit ...`.
#[instrument(skip(cli))]
pub async fn handle_audit_command(cli: &Cli, command: &AuditCommands) -> WardenResult<()> {
    let controller = controller(cli).await?;
    match command {
        AuditCommands::Recent { limit, format } => {
            let events = controller.recent_events(*limit).await?;
            print_events(&events, *format)?;
        }
        AuditCommands::Punishments { user } => {
            let records = controller.punishments_for(*user).await?;
            if records.is_empty() {
                println!("No punishments recorded for {}", user);
            }
            for record in &records {
                let line = json!({
                    "timestamp": record.timestamp().to_rfc3339(),
                    "action": record.action(),
                    "type": record.punishment_type().to_string(),
                    "source": record.guard_source().to_string(),
                    "reason": record.reason(),
                });
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Handle `warden setup`.
#[instrument(skip(cli))]
pub async fn handle_setup_command(cli: &Cli) -> WardenResult<()> {
    let controller = controller(cli).await?;
    let report = controller.setup_log_channels().await?;
    for name in &report.created {
        println!("Created {}", name);
    }
    for name in &report.existing {
        println!("Already present: {}", name);
    }
    Ok(())
}
