//! Embeds in the guild's log channels.

use crate::conversions::to_timestamp;
use crate::error::platform_error;
use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use warden_error::{PlatformError, PlatformErrorKind, PlatformResult};
use warden_interface::{Notice, NotificationSink};

/// [`NotificationSink`] posting to text channels looked up by name.
///
/// Resolved channel ids are remembered; a lookup miss is retried on the next
/// notice so a log channel created later is picked up.
pub struct DiscordSink {
    http: Arc<Http>,
    guild_id: GuildId,
    channels: Mutex<HashMap<String, ChannelId>>,
}

impl DiscordSink {
    /// Post into channels of `guild_id`.
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self {
            http,
            guild_id,
            channels: Mutex::new(HashMap::new()),
        }
    }

    async fn resolve(&self, channel_name: &str) -> PlatformResult<ChannelId> {
        if let Some(id) = self.channels.lock().get(channel_name) {
            return Ok(*id);
        }
        let channels = self
            .guild_id
            .channels(&self.http)
            .await
            .map_err(platform_error)?;
        let id = channels
            .values()
            .find(|channel| channel.name == channel_name)
            .map(|channel| channel.id)
            .ok_or_else(|| {
                PlatformError::new(PlatformErrorKind::NotFound(format!(
                    "log channel #{channel_name}"
                )))
            })?;
        self.channels.lock().insert(channel_name.to_string(), id);
        debug!(channel = channel_name, id = %id, "Resolved log channel");
        Ok(id)
    }
}

fn embed(notice: &Notice) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(notice.title.clone())
        .description(notice.description.clone())
        .colour(notice.color)
        .footer(CreateEmbedFooter::new(notice.footer.clone()))
        .fields(
            notice
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone(), field.inline)),
        );
    if let Some(timestamp) = to_timestamp(notice.timestamp) {
        embed = embed.timestamp(timestamp);
    }
    embed
}

#[async_trait]
impl NotificationSink for DiscordSink {
    #[instrument(skip(self, notice), fields(title = %notice.title))]
    async fn send(&self, channel_name: &str, notice: &Notice) -> PlatformResult<()> {
        let channel = self.resolve(channel_name).await?;
        channel
            .send_message(&self.http, CreateMessage::new().embed(embed(notice)))
            .await
            .map_err(platform_error)?;
        Ok(())
    }
}
