//! Last-known-good entity state and the builders used to restore it.

use crate::Snowflake;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything the state cache can hold.
pub trait Snapshot: Clone + Send + Sync + 'static {
    /// Entity id the snapshot is keyed by.
    fn id(&self) -> Snowflake;

    /// Human-readable name for logs and notifications.
    fn display_name(&self) -> &str;
}

/// Channel type, reduced to the kinds the guard can recreate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Guild text channel
    Text,
    /// Guild voice channel
    Voice,
    /// Category
    Category,
    /// Announcement (news) channel
    Announcement,
    /// Stage channel
    Stage,
    /// Forum channel
    Forum,
    /// Anything else, carrying the raw platform type code
    Other(u8),
}

impl ChannelKind {
    /// Whether members read or talk in this channel (everything except categories).
    pub fn is_text_or_voice(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Voice | Self::Announcement | Self::Stage | Self::Forum
        )
    }
}

/// Who a permission overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum OverwriteTarget {
    /// A role
    Role(Snowflake),
    /// A single member
    Member(Snowflake),
}

/// A channel permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    /// Role or member the overwrite targets
    pub target: OverwriteTarget,
    /// Explicitly allowed bits
    pub allow: u64,
    /// Explicitly denied bits
    pub deny: u64,
}

/// Cached channel state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Channel id
    pub id: Snowflake,
    /// Channel name
    pub name: String,
    /// Channel type
    pub kind: ChannelKind,
    /// Parent category, if any
    pub parent_id: Option<Snowflake>,
    /// Sort position
    pub position: u16,
    /// Permission overwrites
    pub overwrites: Vec<PermissionOverwrite>,
    /// When this state was observed
    pub captured_at: DateTime<Utc>,
}

impl ChannelSnapshot {
    /// Overwrites sorted by target, for order-insensitive comparison.
    pub fn sorted_overwrites(&self) -> Vec<PermissionOverwrite> {
        let mut overwrites = self.overwrites.clone();
        overwrites.sort_by_key(|o| o.target);
        overwrites
    }

    /// Builder input that recreates an equivalent channel.
    pub fn to_spec(&self) -> ChannelSpec {
        ChannelSpec {
            name: self.name.clone(),
            kind: self.kind,
            parent_id: self.parent_id,
            position: self.position,
            overwrites: self.overwrites.clone(),
        }
    }
}

impl Snapshot for ChannelSnapshot {
    fn id(&self) -> Snowflake {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Cached role state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    /// Role id
    pub id: Snowflake,
    /// Role name
    pub name: String,
    /// RGB colour
    pub color: u32,
    /// Permission bitfield
    pub permissions: u64,
    /// Position in the hierarchy
    pub position: u16,
    /// Displayed separately in the member list
    pub hoist: bool,
    /// Mentionable by everyone
    pub mentionable: bool,
    /// When this state was observed
    pub captured_at: DateTime<Utc>,
}

impl RoleSnapshot {
    /// Builder input that recreates an equivalent role.
    pub fn to_spec(&self) -> RoleSpec {
        RoleSpec {
            name: self.name.clone(),
            color: self.color,
            permissions: self.permissions,
            hoist: self.hoist,
            mentionable: self.mentionable,
        }
    }
}

impl Snapshot for RoleSnapshot {
    fn id(&self) -> Snowflake {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Parameters for creating a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Channel name
    pub name: String,
    /// Channel type
    pub kind: ChannelKind,
    /// Parent category
    pub parent_id: Option<Snowflake>,
    /// Sort position
    pub position: u16,
    /// Permission overwrites
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Fields to write back onto an existing channel. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelEdit {
    /// New name
    pub name: Option<String>,
    /// Replacement overwrite set
    pub overwrites: Option<Vec<PermissionOverwrite>>,
}

impl ChannelEdit {
    /// Whether the edit would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.overwrites.is_none()
    }
}

/// Parameters for creating a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Role name
    pub name: String,
    /// RGB colour
    pub color: u32,
    /// Permission bitfield
    pub permissions: u64,
    /// Hoisted
    pub hoist: bool,
    /// Mentionable
    pub mentionable: bool,
}

/// Fields to write back onto an existing role. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEdit {
    /// New name
    pub name: Option<String>,
    /// New colour
    pub color: Option<u32>,
    /// New permission bitfield
    pub permissions: Option<u64>,
    /// New hoist flag
    pub hoist: Option<bool>,
    /// New mentionable flag
    pub mentionable: Option<bool>,
}

impl RoleEdit {
    /// Whether the edit would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.permissions.is_none()
            && self.hoist.is_none()
            && self.mentionable.is_none()
    }
}
