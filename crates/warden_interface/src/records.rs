//! Persisted and ephemeral records produced by the guards.

use crate::{Capability, Snowflake};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An allow-list membership.
///
/// `saved_roles` and `in_sleep_mode` belong to the sleep-mode lifecycle and
/// are carried through untouched by the guards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListEntry {
    /// Allow-listed user
    pub subject_id: Snowflake,
    /// Who granted the entry
    pub granted_by: Option<Snowflake>,
    /// When the entry was granted
    pub granted_at: DateTime<Utc>,
    /// Last time the subject performed an authorized privileged action
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Inactive entries do not authorize anything
    pub active: bool,
    /// Roles stashed while in sleep mode
    pub saved_roles: Vec<Snowflake>,
    /// Whether the subject is in sleep mode
    pub in_sleep_mode: bool,
}

impl AllowListEntry {
    /// New active entry granted now.
    pub fn new(subject_id: Snowflake, granted_by: Option<Snowflake>) -> Self {
        Self {
            subject_id,
            granted_by,
            granted_at: Utc::now(),
            last_seen_at: None,
            active: true,
            saved_roles: Vec::new(),
            in_sleep_mode: false,
        }
    }
}

/// Sanction applied to an unauthorized executor.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PunishmentType {
    /// Replace every role with the quarantine role
    #[default]
    Quarantine,
    /// Kick from the guild
    Kick,
    /// Ban from the guild
    Ban,
    /// Strip every role
    RoleRemove,
    /// Record only
    Warn,
    /// Disable communication for a while
    Timeout,
}

impl PunishmentType {
    /// Capability the enforcing account needs, if any.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            Self::Quarantine | Self::RoleRemove => Some(Capability::ManageRoles),
            Self::Kick => Some(Capability::KickMembers),
            Self::Ban => Some(Capability::BanMembers),
            Self::Timeout => Some(Capability::ModerateMembers),
            Self::Warn => None,
        }
    }

    /// Whether the subject must rank strictly below the enforcing account.
    pub fn checks_hierarchy(self) -> bool {
        matches!(self, Self::Kick | Self::Ban | Self::Timeout)
    }
}

/// Component that produced a record.
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
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum GuardSource {
    /// Ban guard
    #[serde(rename = "GUARD-BAN")]
    #[strum(serialize = "GUARD-BAN")]
    Ban,
    /// Channel guard
    #[serde(rename = "GUARD-CHANNEL")]
    #[strum(serialize = "GUARD-CHANNEL")]
    Channel,
    /// Role guard
    #[serde(rename = "GUARD-ROLE")]
    #[strum(serialize = "GUARD-ROLE")]
    Role,
    /// Administrative commands
    #[serde(rename = "CONTROLLER")]
    #[strum(serialize = "CONTROLLER")]
    Controller,
}

/// Grouping used to pick a notification channel.
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
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogCategory {
    /// Bans and unbans
    Ban,
    /// Channel changes
    Channel,
    /// Role changes
    Role,
    /// Spam filtering
    Spam,
    /// Allow-list and punishment mode changes
    Permission,
    /// Bot additions
    BotAdd,
    /// Failed sanctions and other security events
    Security,
    /// Guild backups
    Backup,
}

/// A sanction that was successfully applied. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct PunishmentRecord {
    /// Punished user
    #[setters(skip)]
    subject_id: Snowflake,
    /// Guard that applied the sanction
    #[setters(skip)]
    guard_source: GuardSource,
    /// Cause, e.g. `ROLE_CREATE_BLOCKED`
    #[setters(skip)]
    action: String,
    /// Free-text detail
    #[setters(into)]
    reason: String,
    /// Sanction applied
    #[setters(skip)]
    punishment_type: PunishmentType,
    /// When it was applied
    timestamp: DateTime<Utc>,
    /// Opaque evidence attachment
    #[setters(strip_option)]
    evidence: Option<JsonValue>,
}

impl PunishmentRecord {
    /// Record stamped now with an empty reason and no evidence.
    pub fn new(
        subject_id: Snowflake,
        guard_source: GuardSource,
        action: impl Into<String>,
        punishment_type: PunishmentType,
    ) -> Self {
        Self {
            subject_id,
            guard_source,
            action: action.into(),
            reason: String::new(),
            punishment_type,
            timestamp: Utc::now(),
            evidence: None,
        }
    }
}

/// One guard decision. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct AuditEvent {
    /// Notification grouping
    #[setters(skip)]
    category: LogCategory,
    /// Who performed the action
    #[setters(strip_option)]
    executor_id: Option<Snowflake>,
    /// Action code, e.g. `CHANNEL_DELETE_BLOCKED`
    #[setters(skip)]
    action: String,
    /// Entity or user acted upon
    #[setters(strip_option)]
    target_id: Option<Snowflake>,
    /// Emitting component
    #[setters(skip)]
    source: GuardSource,
    /// Opaque structured detail
    details: JsonValue,
    /// Whether the action was blocked
    was_blocked: bool,
    /// Decision time
    timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Unblocked event stamped now with no executor, target or details.
    pub fn new(category: LogCategory, action: impl Into<String>, source: GuardSource) -> Self {
        Self {
            category,
            executor_id: None,
            action: action.into(),
            target_id: None,
            source,
            details: JsonValue::Null,
            was_blocked: false,
            timestamp: Utc::now(),
        }
    }

    /// Human-readable detail line, if the details carry one.
    pub fn summary(&self) -> Option<&str> {
        self.details.get("summary").and_then(JsonValue::as_str)
    }
}

/// The newest audit-log entry for an operation, as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Account that performed the action
    pub executor_id: Snowflake,
    /// Entity the action targeted
    pub target_id: Option<Snowflake>,
    /// Reason given, if any
    pub reason: Option<String>,
    /// When the entry was written
    pub timestamp: DateTime<Utc>,
}
