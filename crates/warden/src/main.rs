//! Warden CLI binary.
//!
//! This binary runs one guard process per invocation and provides the
//! administrative commands:
//! - `guard <ban|channel|role>` connects to the gateway and protects the guild
//! - `allowlist`, `punishment` and `quarantine` manage authorization and sanctions
//! - `audit` reads recorded guard decisions
//! - `setup` creates the private log channels

use clap::Parser;

mod cli;
mod observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, handle_allowlist_command, handle_audit_command, handle_punishment_command,
        handle_quarantine_command, handle_setup_command, run_guard,
    };
    use observability::{ObservabilityConfig, init_observability};

    // .env before clap so env-backed flags see it
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    init_observability(
        ObservabilityConfig::new("warden")
            .with_log_level(log_level)
            .with_json_logs(cli.json_logs),
    )?;

    match &cli.command {
        Commands::Guard { kind } => run_guard(&cli, *kind).await?,
        Commands::Allowlist(command) => handle_allowlist_command(&cli, command).await?,
        Commands::Punishment(command) => handle_punishment_command(&cli, command).await?,
        Commands::Quarantine(command) => handle_quarantine_command(&cli, command).await?,
        Commands::Audit(command) => handle_audit_command(&cli, command).await?,
        Commands::Setup => handle_setup_command(&cli).await?,
    }

    Ok(())
}
