//! Mutation events delivered by the gateway.

use crate::{ChannelSnapshot, RoleSnapshot, Snowflake};
use serde::{Deserialize, Serialize};

/// Audit-log action types the correlator queries for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOperation {
    /// A member was banned
    MemberBanAdd,
    /// A ban was lifted
    MemberBanRemove,
    /// A channel was created
    ChannelCreate,
    /// A channel was deleted
    ChannelDelete,
    /// A channel was edited
    ChannelUpdate,
    /// A permission overwrite was added to a channel
    ChannelOverwriteCreate,
    /// A channel permission overwrite was changed
    ChannelOverwriteUpdate,
    /// A permission overwrite was removed from a channel
    ChannelOverwriteDelete,
    /// A role was created
    RoleCreate,
    /// A role was deleted
    RoleDelete,
    /// A role was edited
    RoleUpdate,
    /// A member's roles changed
    MemberRoleUpdate,
    /// A bot account was added
    BotAdd,
}

/// A protected-entity mutation, carrying exactly what its remediation needs.
///
/// `before` values are optional because the gateway only provides them when
/// the platform cache held the entity; policies fall back to their own state
/// cache when they are missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GuardEvent {
    /// A user was banned.
    BanAdded {
        /// Banned user
        user: Snowflake,
    },
    /// A ban was lifted.
    BanRemoved {
        /// Unbanned user
        user: Snowflake,
    },
    /// A channel appeared.
    ChannelCreated {
        /// State of the new channel
        channel: ChannelSnapshot,
    },
    /// A channel was deleted.
    ChannelDeleted {
        /// Last state the gateway reported
        channel: ChannelSnapshot,
    },
    /// A channel was edited.
    ChannelUpdated {
        /// State before the edit, if known
        before: Option<ChannelSnapshot>,
        /// State after the edit
        after: ChannelSnapshot,
    },
    /// A role appeared.
    RoleCreated {
        /// State of the new role
        role: RoleSnapshot,
    },
    /// A role was deleted.
    RoleDeleted {
        /// Id of the deleted role
        role_id: Snowflake,
        /// Last state the gateway reported, if known
        role: Option<RoleSnapshot>,
    },
    /// A role was edited.
    RoleUpdated {
        /// State before the edit, if known
        before: Option<RoleSnapshot>,
        /// State after the edit
        after: RoleSnapshot,
    },
    /// A member's role set changed.
    MemberRolesUpdated {
        /// Affected member
        member: Snowflake,
        /// Role ids before the change, if known
        before: Option<Vec<Snowflake>>,
        /// Role ids after the change
        after: Vec<Snowflake>,
    },
    /// A bot account joined.
    BotAdded {
        /// The bot's user id
        bot: Snowflake,
    },
}

impl GuardEvent {
    /// Primary audit-log action type of this event.
    ///
    /// Channel permission edits are logged under the overwrite action types
    /// instead; see `GuardPolicy::audit_operations` in `warden_guard`.
    pub fn operation(&self) -> AuditOperation {
        match self {
            Self::BanAdded { .. } => AuditOperation::MemberBanAdd,
            Self::BanRemoved { .. } => AuditOperation::MemberBanRemove,
            Self::ChannelCreated { .. } => AuditOperation::ChannelCreate,
            Self::ChannelDeleted { .. } => AuditOperation::ChannelDelete,
            Self::ChannelUpdated { .. } => AuditOperation::ChannelUpdate,
            Self::RoleCreated { .. } => AuditOperation::RoleCreate,
            Self::RoleDeleted { .. } => AuditOperation::RoleDelete,
            Self::RoleUpdated { .. } => AuditOperation::RoleUpdate,
            Self::MemberRolesUpdated { .. } => AuditOperation::MemberRoleUpdate,
            Self::BotAdded { .. } => AuditOperation::BotAdd,
        }
    }

    /// Id of the entity or user the mutation concerns.
    pub fn subject(&self) -> Snowflake {
        match self {
            Self::BanAdded { user } | Self::BanRemoved { user } => *user,
            Self::ChannelCreated { channel } | Self::ChannelDeleted { channel } => channel.id,
            Self::ChannelUpdated { after, .. } => after.id,
            Self::RoleCreated { role } => role.id,
            Self::RoleDeleted { role_id, .. } => *role_id,
            Self::RoleUpdated { after, .. } => after.id,
            Self::MemberRolesUpdated { member, .. } => *member,
            Self::BotAdded { bot } => *bot,
        }
    }

    /// Whether the audit entry's target must equal [`Self::subject`].
    ///
    /// Updates can race with other edits of a different entity, so their
    /// correlation is cross-checked. Creations, deletions and bans are not.
    pub fn requires_target_match(&self) -> bool {
        matches!(
            self,
            Self::ChannelUpdated { .. }
                | Self::RoleUpdated { .. }
                | Self::MemberRolesUpdated { .. }
                | Self::BotAdded { .. }
        )
    }
}
