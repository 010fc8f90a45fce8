//! Gateway events translated into [`GuardEvent`]s.

use crate::conversions::{channel_snapshot, role_snapshot};
use serenity::all::{GuildId, GuildMemberUpdateEvent, Ready};
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::channel::{GuildChannel, Message};
use serenity::model::gateway::GatewayIntents;
use serenity::model::guild::{Member, Role};
use serenity::model::id::RoleId;
use serenity::model::user::User;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use warden_guard::GuardMessage;
use warden_interface::{GuardEvent, GuardSource, Snowflake};

/// Guard process that owns an event.
pub fn event_source(event: &GuardEvent) -> GuardSource {
    match event {
        GuardEvent::BanAdded { .. } | GuardEvent::BanRemoved { .. } => GuardSource::Ban,
        GuardEvent::ChannelCreated { .. }
        | GuardEvent::ChannelDeleted { .. }
        | GuardEvent::ChannelUpdated { .. } => GuardSource::Channel,
        GuardEvent::RoleCreated { .. }
        | GuardEvent::RoleDeleted { .. }
        | GuardEvent::RoleUpdated { .. }
        | GuardEvent::MemberRolesUpdated { .. }
        | GuardEvent::BotAdded { .. } => GuardSource::Role,
    }
}

/// Event handler for one guard process.
///
/// Drops events from other guilds and events another guard owns, then queues
/// the rest for the [`GuardWorker`](warden_guard::GuardWorker).
pub struct WardenHandler {
    guild_id: GuildId,
    source: GuardSource,
    tx: mpsc::Sender<GuardMessage>,
}

impl WardenHandler {
    /// Forward events of `source` in `guild_id` to `tx`.
    pub fn new(guild_id: GuildId, source: GuardSource, tx: mpsc::Sender<GuardMessage>) -> Self {
        Self {
            guild_id,
            source,
            tx,
        }
    }

    /// Gateway intents a guard needs.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS | GatewayIntents::GUILD_MODERATION
    }

    /// Whether this handler forwards `event` from `guild_id`.
    pub fn accepts(&self, guild_id: GuildId, event: &GuardEvent) -> bool {
        guild_id == self.guild_id && event_source(event) == self.source
    }

    async fn forward(&self, guild_id: GuildId, event: GuardEvent) {
        if !self.accepts(guild_id, &event) {
            return;
        }
        debug!(guild_id = %guild_id, event = ?event, "Queueing event");
        if self.tx.send(GuardMessage::Event(event)).await.is_err() {
            warn!(guard = %self.source, "Guard worker has stopped, event dropped");
        }
    }
}

fn role_ids(roles: &[RoleId]) -> Vec<Snowflake> {
    roles.iter().map(|id| Snowflake(id.get())).collect()
}

#[async_trait]
impl EventHandler for WardenHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guard = %self.source,
            guild_id = %self.guild_id,
            "Connected to gateway"
        );
    }

    async fn guild_ban_addition(&self, _ctx: Context, guild_id: GuildId, banned_user: User) {
        let event = GuardEvent::BanAdded {
            user: Snowflake(banned_user.id.get()),
        };
        self.forward(guild_id, event).await;
    }

    async fn guild_ban_removal(&self, _ctx: Context, guild_id: GuildId, unbanned_user: User) {
        let event = GuardEvent::BanRemoved {
            user: Snowflake(unbanned_user.id.get()),
        };
        self.forward(guild_id, event).await;
    }

    async fn channel_create(&self, _ctx: Context, channel: GuildChannel) {
        let event = GuardEvent::ChannelCreated {
            channel: channel_snapshot(&channel),
        };
        self.forward(channel.guild_id, event).await;
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        let event = GuardEvent::ChannelDeleted {
            channel: channel_snapshot(&channel),
        };
        self.forward(channel.guild_id, event).await;
    }

    async fn channel_update(&self, _ctx: Context, old: Option<GuildChannel>, new: GuildChannel) {
        let event = GuardEvent::ChannelUpdated {
            before: old.as_ref().map(channel_snapshot),
            after: channel_snapshot(&new),
        };
        self.forward(new.guild_id, event).await;
    }

    async fn guild_role_create(&self, _ctx: Context, new: Role) {
        let event = GuardEvent::RoleCreated {
            role: role_snapshot(&new),
        };
        self.forward(new.guild_id, event).await;
    }

    async fn guild_role_delete(
        &self,
        _ctx: Context,
        guild_id: GuildId,
        removed_role_id: RoleId,
        removed_role_data_if_available: Option<Role>,
    ) {
        let event = GuardEvent::RoleDeleted {
            role_id: Snowflake(removed_role_id.get()),
            role: removed_role_data_if_available.as_ref().map(role_snapshot),
        };
        self.forward(guild_id, event).await;
    }

    async fn guild_role_update(&self, _ctx: Context, old: Option<Role>, new: Role) {
        let event = GuardEvent::RoleUpdated {
            before: old.as_ref().map(role_snapshot),
            after: role_snapshot(&new),
        };
        self.forward(new.guild_id, event).await;
    }

    async fn guild_member_update(
        &self,
        _ctx: Context,
        old_if_available: Option<Member>,
        _new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        let guard_event = GuardEvent::MemberRolesUpdated {
            member: Snowflake(event.user.id.get()),
            before: old_if_available.map(|member| role_ids(&member.roles)),
            after: role_ids(&event.roles),
        };
        self.forward(event.guild_id, guard_event).await;
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        if !new_member.user.bot {
            return;
        }
        let event = GuardEvent::BotAdded {
            bot: Snowflake(new_member.user.id.get()),
        };
        self.forward(new_member.guild_id, event).await;
    }
}
