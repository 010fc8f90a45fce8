//! Remedial operations through the REST API.

use crate::conversions::{channel_snapshot, channel_type, overwrite_to, role_snapshot, to_timestamp};
use crate::error::{is_not_found, platform_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::{CreateChannel, EditChannel, EditMember, EditRole};
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::{Colour, Permissions};
use std::sync::Arc;
use tracing::{debug, instrument};
use warden_error::{PlatformError, PlatformResult};
use warden_interface::{
    ChannelEdit, ChannelSnapshot, ChannelSpec, GuildSurface, PermissionOverwrite, RoleEdit,
    RoleSnapshot, RoleSpec, Snowflake, Standing,
};

/// [`GuildSurface`] for one guild, acting as the bot account.
#[derive(Clone)]
pub struct SerenityGuild {
    http: Arc<Http>,
    guild_id: GuildId,
    own_id: UserId,
}

impl SerenityGuild {
    /// Resolve the bot's own account and bind to `guild_id`.
    ///
    /// # Errors
    ///
    /// Fails if the current user cannot be fetched (usually a bad token).
    #[instrument(skip(http), fields(guild_id = %guild_id))]
    pub async fn connect(http: Arc<Http>, guild_id: GuildId) -> PlatformResult<Self> {
        let me = http.get_current_user().await.map_err(platform_error)?;
        debug!(own_id = %me.id, "Resolved bot account");
        Ok(Self {
            http,
            guild_id,
            own_id: me.id,
        })
    }

    /// The REST client.
    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }

    /// The protected guild.
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    async fn standing_of(&self, user: UserId) -> PlatformResult<Option<Standing>> {
        let member = match self.guild_id.member(&self.http, user).await {
            Ok(member) => member,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(platform_error(e)),
        };
        let roles = self
            .guild_id
            .roles(&self.http)
            .await
            .map_err(platform_error)?;
        let everyone = roles
            .get(&RoleId::new(self.guild_id.get()))
            .map(|role| role.permissions.bits())
            .unwrap_or(0);
        let (rank, permissions) = member
            .roles
            .iter()
            .filter_map(|id| roles.get(id))
            .fold((0u16, everyone), |(rank, permissions), role| {
                (rank.max(role.position), permissions | role.permissions.bits())
            });
        let guild = self
            .http
            .get_guild(self.guild_id)
            .await
            .map_err(platform_error)?;

        Ok(Some(Standing {
            rank,
            permissions,
            is_owner: guild.owner_id == user,
        }))
    }
}

fn channel_id(id: Snowflake) -> ChannelId {
    ChannelId::new(id.get())
}

fn role_id(id: Snowflake) -> RoleId {
    RoleId::new(id.get())
}

fn user_id(id: Snowflake) -> UserId {
    UserId::new(id.get())
}

#[async_trait]
impl GuildSurface for SerenityGuild {
    fn own_id(&self) -> Snowflake {
        Snowflake(self.own_id.get())
    }

    async fn list_channels(&self) -> PlatformResult<Vec<ChannelSnapshot>> {
        let channels = self
            .guild_id
            .channels(&self.http)
            .await
            .map_err(platform_error)?;
        Ok(channels.values().map(channel_snapshot).collect())
    }

    async fn list_roles(&self) -> PlatformResult<Vec<RoleSnapshot>> {
        let roles = self
            .guild_id
            .roles(&self.http)
            .await
            .map_err(platform_error)?;
        Ok(roles.values().map(role_snapshot).collect())
    }

    #[instrument(skip(self, spec), fields(name = %spec.name))]
    async fn create_channel(
        &self,
        spec: &ChannelSpec,
        reason: &str,
    ) -> PlatformResult<ChannelSnapshot> {
        let mut builder = CreateChannel::new(spec.name.clone())
            .kind(channel_type(spec.kind))
            .position(spec.position)
            .permissions(spec.overwrites.iter().copied().map(overwrite_to))
            .audit_log_reason(reason);
        if let Some(parent) = spec.parent_id {
            builder = builder.category(channel_id(parent));
        }
        let channel = self
            .guild_id
            .create_channel(&self.http, builder)
            .await
            .map_err(platform_error)?;
        Ok(channel_snapshot(&channel))
    }

    #[instrument(skip(self, edit), fields(channel = %channel))]
    async fn edit_channel(
        &self,
        channel: Snowflake,
        edit: &ChannelEdit,
        reason: &str,
    ) -> PlatformResult<()> {
        let mut builder = EditChannel::new().audit_log_reason(reason);
        if let Some(name) = &edit.name {
            builder = builder.name(name.clone());
        }
        if let Some(overwrites) = &edit.overwrites {
            builder = builder.permissions(overwrites.iter().copied().map(overwrite_to));
        }
        channel_id(channel)
            .edit(&self.http, builder)
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(channel = %channel))]
    async fn delete_channel(&self, channel: Snowflake, reason: &str) -> PlatformResult<()> {
        self.http
            .delete_channel(channel_id(channel), Some(reason))
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    async fn add_channel_overwrite(
        &self,
        channel: Snowflake,
        overwrite: PermissionOverwrite,
        _reason: &str,
    ) -> PlatformResult<()> {
        channel_id(channel)
            .create_permission(&self.http, overwrite_to(overwrite))
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self, spec), fields(name = %spec.name))]
    async fn create_role(&self, spec: &RoleSpec, reason: &str) -> PlatformResult<RoleSnapshot> {
        let builder = EditRole::new()
            .name(spec.name.clone())
            .colour(Colour::new(spec.color))
            .permissions(Permissions::from_bits_truncate(spec.permissions))
            .hoist(spec.hoist)
            .mentionable(spec.mentionable)
            .audit_log_reason(reason);
        let role = self
            .guild_id
            .create_role(&self.http, builder)
            .await
            .map_err(platform_error)?;
        Ok(role_snapshot(&role))
    }

    #[instrument(skip(self, edit), fields(role = %role))]
    async fn edit_role(&self, role: Snowflake, edit: &RoleEdit, reason: &str) -> PlatformResult<()> {
        let mut builder = EditRole::new().audit_log_reason(reason);
        if let Some(name) = &edit.name {
            builder = builder.name(name.clone());
        }
        if let Some(color) = edit.color {
            builder = builder.colour(Colour::new(color));
        }
        if let Some(permissions) = edit.permissions {
            builder = builder.permissions(Permissions::from_bits_truncate(permissions));
        }
        if let Some(hoist) = edit.hoist {
            builder = builder.hoist(hoist);
        }
        if let Some(mentionable) = edit.mentionable {
            builder = builder.mentionable(mentionable);
        }
        self.guild_id
            .edit_role(&self.http, role_id(role), builder)
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(role = %role))]
    async fn delete_role(&self, role: Snowflake, reason: &str) -> PlatformResult<()> {
        self.http
            .delete_role(self.guild_id, role_id(role), Some(reason))
            .await
            .map_err(platform_error)
    }

    async fn member_roles(&self, member: Snowflake) -> PlatformResult<Option<Vec<Snowflake>>> {
        match self.guild_id.member(&self.http, user_id(member)).await {
            Ok(member) => Ok(Some(
                member.roles.iter().map(|id| Snowflake(id.get())).collect(),
            )),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(platform_error(e)),
        }
    }

    #[instrument(skip(self, roles), fields(member = %member, roles = roles.len()))]
    async fn set_member_roles(
        &self,
        member: Snowflake,
        roles: &[Snowflake],
        reason: &str,
    ) -> PlatformResult<()> {
        let builder = EditMember::new()
            .roles(roles.iter().map(|id| role_id(*id)))
            .audit_log_reason(reason);
        self.guild_id
            .edit_member(&self.http, user_id(member), builder)
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    async fn remove_member_role(
        &self,
        member: Snowflake,
        role: Snowflake,
        reason: &str,
    ) -> PlatformResult<()> {
        self.http
            .remove_member_role(self.guild_id, user_id(member), role_id(role), Some(reason))
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self), fields(member = %member))]
    async fn kick(&self, member: Snowflake, reason: &str) -> PlatformResult<()> {
        self.guild_id
            .kick_with_reason(&self.http, user_id(member), reason)
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn ban(&self, user: Snowflake, reason: &str) -> PlatformResult<()> {
        self.guild_id
            .ban_with_reason(&self.http, user_id(user), 0, reason)
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn unban(&self, user: Snowflake, reason: &str) -> PlatformResult<()> {
        self.http
            .remove_ban(self.guild_id, user_id(user), Some(reason))
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self), fields(member = %member, until = %until))]
    async fn timeout(
        &self,
        member: Snowflake,
        until: DateTime<Utc>,
        reason: &str,
    ) -> PlatformResult<()> {
        let until = to_timestamp(until)
            .ok_or_else(|| PlatformError::api("timeout end is out of range"))?;
        let builder = EditMember::new()
            .disable_communication_until_datetime(until)
            .audit_log_reason(reason);
        self.guild_id
            .edit_member(&self.http, user_id(member), builder)
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    async fn own_standing(&self) -> PlatformResult<Standing> {
        self.standing_of(self.own_id)
            .await?
            .ok_or_else(|| PlatformError::api("bot account is not a member of the guild"))
    }

    async fn member_standing(&self, member: Snowflake) -> PlatformResult<Option<Standing>> {
        self.standing_of(user_id(member)).await
    }
}
