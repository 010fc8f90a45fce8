//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use warden_interface::{GuardSource, PunishmentType, Snowflake};

/// Warden - reverses unauthorized guild changes and sanctions their authors
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Reverses unauthorized guild changes and sanctions their authors", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (layered over the bundled defaults)
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bot token of the account that acts on the guild
    #[arg(long, global = true, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// PostgreSQL connection string
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the gateway and run one guard until interrupted
    Guard {
        /// Which guard to run
        kind: GuardKind,
    },

    /// Allow-list management
    #[command(subcommand)]
    Allowlist(AllowlistCommands),

    /// Punishment mode
    #[command(subcommand)]
    Punishment(PunishmentCommands),

    /// Quarantine management
    #[command(subcommand)]
    Quarantine(QuarantineCommands),

    /// Recorded guard decisions
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Create the private log category and channels
    Setup,
}

/// Allow-list subcommands
#[derive(Subcommand, Debug)]
pub enum AllowlistCommands {
    /// Authorize a user to make protected changes
    Add {
        /// User id or mention
        user: Snowflake,

        /// Administrator granting the entry
        #[arg(long = "by")]
        granted_by: Snowflake,
    },

    /// Revoke a user's authorization
    Remove {
        /// User id or mention
        user: Snowflake,

        /// Administrator revoking the entry
        #[arg(long = "by")]
        revoked_by: Snowflake,
    },

    /// Show active entries
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

/// Punishment subcommands
#[derive(Subcommand, Debug)]
pub enum PunishmentCommands {
    /// Print the current punishment type
    Show,

    /// Change the punishment type and write it to the config file
    Set {
        /// quarantine, kick, ban, role_remove, warn or timeout
        kind: PunishmentType,

        /// Administrator making the change
        #[arg(long = "by")]
        changed_by: Snowflake,
    },
}

/// Quarantine subcommands
#[derive(Subcommand, Debug)]
pub enum QuarantineCommands {
    /// Take the quarantine role away from a member
    Release {
        /// User id or mention
        user: Snowflake,

        /// Administrator releasing the member
        #[arg(long = "by")]
        released_by: Snowflake,
    },
}

/// Audit subcommands
#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// Most recent guard decisions, newest first
    Recent {
        /// Maximum number of events to display
        #[arg(long, default_value = "20")]
        limit: i64,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Sanctions applied to one user
    Punishments {
        /// User id or mention
        user: Snowflake,
    },
}

/// Guard process to run
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardKind {
    /// Bans and unbans
    Ban,
    /// Channel creation, deletion and edits
    Channel,
    /// Roles, member role sets and bot additions
    Role,
}

impl From<GuardKind> for GuardSource {
    fn from(kind: GuardKind) -> Self {
        match kind {
            GuardKind::Ban => GuardSource::Ban,
            GuardKind::Channel => GuardSource::Channel,
            GuardKind::Role => GuardSource::Role,
        }
    }
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
