//! Command-line interface module.
//!
//! This module provides the CLI structure, the shared service wiring and the
//! command handlers for the warden binary.

mod admin;
mod commands;
mod guard;

pub use admin::{
    handle_allowlist_command, handle_audit_command, handle_punishment_command,
    handle_quarantine_command, handle_setup_command,
};
pub use commands::{
    AllowlistCommands, AuditCommands, Cli, Commands, GuardKind, OutputFormat, PunishmentCommands,
    QuarantineCommands,
};
pub use guard::run_guard;

use std::sync::Arc;
use tracing::{debug, instrument};
use warden_database::{PgGuardRepository, connect_pool, run_migrations};
use warden_discord::{DiscordSink, GuildId, SerenityAuditTrail, SerenityGuild};
use warden_error::{ConfigError, WardenResult};
use warden_guard::{ConfigHandle, GuardServices};

/// Pool size for one warden process.
const POOL_SIZE: u32 = 4;

/// Settings every command resolves before doing any work.
pub struct Connection {
    /// Bot token
    pub token: String,
    /// Protected guild
    pub guild_id: GuildId,
    /// Live configuration
    pub config: ConfigHandle,
    /// Durable store
    pub repository: Arc<PgGuardRepository>,
}

impl Connection {
    /// Load the configuration and open the database.
    ///
    /// # Errors
    ///
    /// Fails if the token or database URL is missing, the configuration does
    /// not parse or names no guild, or the database is unreachable.
    #[instrument(skip(cli))]
    pub async fn open(cli: &Cli) -> WardenResult<Self> {
        let token = cli
            .token
            .clone()
            .ok_or_else(|| ConfigError::new("DISCORD_TOKEN is not set (or pass --token)"))?;
        let database_url = cli
            .database_url
            .clone()
            .ok_or_else(|| ConfigError::new("DATABASE_URL is not set (or pass --database-url)"))?;

        let config = ConfigHandle::load(cli.config.clone())?;
        let guild = config.read(|c| *c.guild_id());
        if guild.get() == 0 {
            return Err(ConfigError::new("guild_id must be set in the configuration").into());
        }

        let pool = tokio::task::spawn_blocking(move || {
            let pool = connect_pool(&database_url, POOL_SIZE)?;
            run_migrations(&pool)?;
            Ok::<_, warden_error::DatabaseError>(pool)
        })
        .await
        .map_err(|e| ConfigError::new(format!("Database setup task failed: {e}")))??;
        debug!(guild_id = %guild, "Database ready");

        Ok(Self {
            token,
            guild_id: GuildId::new(guild.get()),
            config,
            repository: Arc::new(PgGuardRepository::new(pool)),
        })
    }

    /// Wire the Discord adapters to the shared services.
    ///
    /// # Errors
    ///
    /// Fails if the bot account cannot be resolved.
    pub async fn services(&self, http: Arc<warden_discord::Http>) -> WardenResult<GuardServices> {
        let surface = SerenityGuild::connect(http.clone(), self.guild_id).await?;
        Ok(GuardServices {
            surface: Arc::new(surface),
            trail: Arc::new(SerenityAuditTrail::new(http.clone(), self.guild_id)),
            repository: self.repository.clone(),
            sink: Some(Arc::new(DiscordSink::new(http, self.guild_id))),
            config: self.config.clone(),
        })
    }
}
