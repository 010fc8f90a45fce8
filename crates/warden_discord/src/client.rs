//! Gateway client for one guard process.

use crate::handler::WardenHandler;
use serenity::Client;
use serenity::gateway::ShardManager;
use serenity::http::Http;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument};
use warden_error::{PlatformError, PlatformErrorKind, PlatformResult};
use warden_guard::GuardMessage;
use warden_interface::GuardSource;

/// Serenity client feeding a guard worker.
///
/// # Example
/// ```no_run
/// use warden_discord::{GuildId, WardenBot};
/// use warden_interface::GuardSource;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let (tx, _rx) = tokio::sync::mpsc::channel(256);
/// let token = std::env::var("DISCORD_TOKEN")?;
/// let mut bot = WardenBot::new(&token, GuildId::new(1), GuardSource::Role, tx).await?;
/// bot.start().await?;
/// # Ok(())
/// # }
/// ```
pub struct WardenBot {
    client: Client,
}

impl WardenBot {
    /// Build a client for the guard `source` of `guild_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformErrorKind::Gateway`] if the client cannot be built.
    #[instrument(skip(token, tx), fields(token_len = token.len()))]
    pub async fn new(
        token: &str,
        guild_id: GuildId,
        source: GuardSource,
        tx: mpsc::Sender<GuardMessage>,
    ) -> PlatformResult<Self> {
        let handler = WardenHandler::new(guild_id, source, tx);
        let intents = WardenHandler::intents();
        info!(?intents, "Building Serenity client");

        let client = Client::builder(token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| {
                PlatformError::new(PlatformErrorKind::Gateway(format!(
                    "Failed to build client: {e}"
                )))
            })?;
        Ok(Self { client })
    }

    /// REST client sharing the gateway's token and rate limits.
    pub fn http(&self) -> Arc<Http> {
        self.client.http.clone()
    }

    /// Run the gateway connection until it fails or is shut down.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformErrorKind::Gateway`] when the connection ends with
    /// an error.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> PlatformResult<()> {
        info!("Starting gateway connection");
        self.client.start().await.map_err(|e| {
            PlatformError::new(PlatformErrorKind::Gateway(format!("Client error: {e}")))
        })
    }

    /// Handle that closes every shard, usable while [`start`](Self::start)
    /// is running.
    pub fn shard_manager(&self) -> Arc<ShardManager> {
        self.client.shard_manager.clone()
    }
}
