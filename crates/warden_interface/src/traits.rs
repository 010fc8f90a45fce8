//! Collaborator traits the reversal engine is written against.

use crate::{
    AllowListEntry, AuditEntry, AuditEvent, AuditOperation, ChannelEdit, ChannelSnapshot,
    ChannelSpec, Notice, PermissionOverwrite, PunishmentRecord, RoleEdit, RoleSnapshot, RoleSpec,
    Snowflake, Standing,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warden_error::{DatabaseError, PlatformResult};

/// Result type for repository calls.
pub type StoreResult<T> = Result<T, DatabaseError>;

/// Read access to the platform's audit log.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Most recent entries of `operation`, newest first.
    async fn query_recent(
        &self,
        operation: AuditOperation,
        limit: u8,
    ) -> PlatformResult<Vec<AuditEntry>>;
}

/// Remedial operations on the protected guild.
///
/// Every mutating call records `reason` in the platform's audit log.
#[async_trait]
pub trait GuildSurface: Send + Sync {
    /// The guard's own account id.
    fn own_id(&self) -> Snowflake;

    /// Every channel in the guild.
    async fn list_channels(&self) -> PlatformResult<Vec<ChannelSnapshot>>;

    /// Every role in the guild.
    async fn list_roles(&self) -> PlatformResult<Vec<RoleSnapshot>>;

    /// Create a channel, returning its state (with the new id).
    async fn create_channel(&self, spec: &ChannelSpec, reason: &str)
    -> PlatformResult<ChannelSnapshot>;

    /// Write fields back onto a channel.
    async fn edit_channel(
        &self,
        channel: Snowflake,
        edit: &ChannelEdit,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Delete a channel.
    async fn delete_channel(&self, channel: Snowflake, reason: &str) -> PlatformResult<()>;

    /// Add or replace one permission overwrite on a channel.
    async fn add_channel_overwrite(
        &self,
        channel: Snowflake,
        overwrite: PermissionOverwrite,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Create a role, returning its state (with the new id).
    async fn create_role(&self, spec: &RoleSpec, reason: &str) -> PlatformResult<RoleSnapshot>;

    /// Write fields back onto a role.
    async fn edit_role(&self, role: Snowflake, edit: &RoleEdit, reason: &str)
    -> PlatformResult<()>;

    /// Delete a role.
    async fn delete_role(&self, role: Snowflake, reason: &str) -> PlatformResult<()>;

    /// First role whose name matches exactly.
    async fn find_role_by_name(&self, name: &str) -> PlatformResult<Option<RoleSnapshot>> {
        Ok(self
            .list_roles()
            .await?
            .into_iter()
            .find(|role| role.name == name))
    }

    /// Role ids a member currently holds, or `None` if not a member.
    async fn member_roles(&self, member: Snowflake) -> PlatformResult<Option<Vec<Snowflake>>>;

    /// Replace a member's entire role set.
    async fn set_member_roles(
        &self,
        member: Snowflake,
        roles: &[Snowflake],
        reason: &str,
    ) -> PlatformResult<()>;

    /// Remove one role from a member.
    async fn remove_member_role(
        &self,
        member: Snowflake,
        role: Snowflake,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Kick a member.
    async fn kick(&self, member: Snowflake, reason: &str) -> PlatformResult<()>;

    /// Ban a user.
    async fn ban(&self, user: Snowflake, reason: &str) -> PlatformResult<()>;

    /// Lift a ban.
    async fn unban(&self, user: Snowflake, reason: &str) -> PlatformResult<()>;

    /// Disable a member's communication until `until`.
    async fn timeout(
        &self,
        member: Snowflake,
        until: DateTime<Utc>,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Rank and permissions of the guard's own account.
    async fn own_standing(&self) -> PlatformResult<Standing>;

    /// Rank and permissions of a member, or `None` if not a member.
    async fn member_standing(&self, member: Snowflake) -> PlatformResult<Option<Standing>>;
}

/// Outbound notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Send `notice` to the channel called `channel_name`.
    async fn send(&self, channel_name: &str, notice: &Notice) -> PlatformResult<()>;
}

/// Durable storage for allow-list entries, punishments and audit events.
#[async_trait]
pub trait GuardRepository: Send + Sync {
    /// Entry for `subject`, active or not.
    async fn find_allow_entry(&self, subject: Snowflake) -> StoreResult<Option<AllowListEntry>>;

    /// Insert a new entry. Fails with a duplicate error if one exists.
    async fn insert_allow_entry(&self, entry: &AllowListEntry) -> StoreResult<()>;

    /// Delete the entry for `subject`, returning whether one existed.
    async fn delete_allow_entry(&self, subject: Snowflake) -> StoreResult<bool>;

    /// All active entries, oldest grant first.
    async fn list_active_allow_entries(&self) -> StoreResult<Vec<AllowListEntry>>;

    /// Record that `subject` was just seen acting with authorization.
    async fn touch_last_seen(&self, subject: Snowflake, at: DateTime<Utc>) -> StoreResult<()>;

    /// Append a punishment record.
    async fn insert_punishment(&self, record: &PunishmentRecord) -> StoreResult<()>;

    /// Punishments applied to `subject`, newest first.
    async fn punishments_for(&self, subject: Snowflake) -> StoreResult<Vec<PunishmentRecord>>;

    /// Append an audit event.
    async fn insert_audit_event(&self, event: &AuditEvent) -> StoreResult<()>;

    /// Most recent audit events, newest first.
    async fn recent_audit_events(&self, limit: i64) -> StoreResult<Vec<AuditEvent>>;
}
