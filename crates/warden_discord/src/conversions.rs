//! Conversions between Serenity models and Warden snapshots.

use chrono::{DateTime, Utc};
use serenity::all::{
    ChannelType, GuildChannel, PermissionOverwriteType, Permissions, Role, RoleId, UserId,
};
use serenity::model::channel::PermissionOverwrite as SerenityOverwrite;
use serenity::model::guild::audit_log::{
    Action, ChannelAction, ChannelOverwriteAction, MemberAction, RoleAction,
};
use serenity::model::Timestamp;
use warden_interface::{
    AuditOperation, ChannelKind, ChannelSnapshot, OverwriteTarget, PermissionOverwrite,
    RoleSnapshot, Snowflake,
};

/// Map a Serenity channel type to a [`ChannelKind`].
pub fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text => ChannelKind::Text,
        ChannelType::Voice => ChannelKind::Voice,
        ChannelType::Category => ChannelKind::Category,
        ChannelType::News => ChannelKind::Announcement,
        ChannelType::Stage => ChannelKind::Stage,
        ChannelType::Forum => ChannelKind::Forum,
        other => ChannelKind::Other(u8::from(other)),
    }
}

/// Map a [`ChannelKind`] back to a Serenity channel type.
pub fn channel_type(kind: ChannelKind) -> ChannelType {
    match kind {
        ChannelKind::Text => ChannelType::Text,
        ChannelKind::Voice => ChannelType::Voice,
        ChannelKind::Category => ChannelType::Category,
        ChannelKind::Announcement => ChannelType::News,
        ChannelKind::Stage => ChannelType::Stage,
        ChannelKind::Forum => ChannelType::Forum,
        ChannelKind::Other(raw) => ChannelType::from(raw),
    }
}

/// Convert a Serenity overwrite. Overwrite targets this crate does not know
/// are dropped.
pub fn overwrite_from(overwrite: &SerenityOverwrite) -> Option<PermissionOverwrite> {
    let target = match overwrite.kind {
        PermissionOverwriteType::Role(id) => OverwriteTarget::Role(Snowflake(id.get())),
        PermissionOverwriteType::Member(id) => OverwriteTarget::Member(Snowflake(id.get())),
        _ => return None,
    };
    Some(PermissionOverwrite {
        target,
        allow: overwrite.allow.bits(),
        deny: overwrite.deny.bits(),
    })
}

/// Convert an overwrite for a Serenity builder.
pub fn overwrite_to(overwrite: PermissionOverwrite) -> SerenityOverwrite {
    let kind = match overwrite.target {
        OverwriteTarget::Role(id) => PermissionOverwriteType::Role(RoleId::new(id.get())),
        OverwriteTarget::Member(id) => PermissionOverwriteType::Member(UserId::new(id.get())),
    };
    SerenityOverwrite {
        allow: Permissions::from_bits_truncate(overwrite.allow),
        deny: Permissions::from_bits_truncate(overwrite.deny),
        kind,
    }
}

/// Snapshot a guild channel.
pub fn channel_snapshot(channel: &GuildChannel) -> ChannelSnapshot {
    ChannelSnapshot {
        id: Snowflake(channel.id.get()),
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
        parent_id: channel.parent_id.map(|id| Snowflake(id.get())),
        position: channel.position,
        overwrites: channel
            .permission_overwrites
            .iter()
            .filter_map(overwrite_from)
            .collect(),
        captured_at: Utc::now(),
    }
}

/// Snapshot a role.
pub fn role_snapshot(role: &Role) -> RoleSnapshot {
    RoleSnapshot {
        id: Snowflake(role.id.get()),
        name: role.name.clone(),
        color: role.colour.0,
        permissions: role.permissions.bits(),
        position: role.position,
        hoist: role.hoist,
        mentionable: role.mentionable,
        captured_at: Utc::now(),
    }
}

/// Audit-log action type for an operation.
pub fn audit_action(operation: AuditOperation) -> Action {
    match operation {
        AuditOperation::MemberBanAdd => Action::Member(MemberAction::BanAdd),
        AuditOperation::MemberBanRemove => Action::Member(MemberAction::BanRemove),
        AuditOperation::ChannelCreate => Action::Channel(ChannelAction::Create),
        AuditOperation::ChannelDelete => Action::Channel(ChannelAction::Delete),
        AuditOperation::ChannelUpdate => Action::Channel(ChannelAction::Update),
        AuditOperation::ChannelOverwriteCreate => {
            Action::ChannelOverwrite(ChannelOverwriteAction::Create)
        }
        AuditOperation::ChannelOverwriteUpdate => {
            Action::ChannelOverwrite(ChannelOverwriteAction::Update)
        }
        AuditOperation::ChannelOverwriteDelete => {
            Action::ChannelOverwrite(ChannelOverwriteAction::Delete)
        }
        AuditOperation::RoleCreate => Action::Role(RoleAction::Create),
        AuditOperation::RoleDelete => Action::Role(RoleAction::Delete),
        AuditOperation::RoleUpdate => Action::Role(RoleAction::Update),
        AuditOperation::MemberRoleUpdate => Action::Member(MemberAction::RoleUpdate),
        AuditOperation::BotAdd => Action::Member(MemberAction::BotAdd),
    }
}

/// Serenity timestamp to chrono, falling back to now.
pub fn to_datetime(timestamp: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_else(Utc::now)
}

/// Chrono timestamp to Serenity, if representable.
pub fn to_timestamp(at: DateTime<Utc>) -> Option<Timestamp> {
    Timestamp::from_unix_timestamp(at.timestamp()).ok()
}
