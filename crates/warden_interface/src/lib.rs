//! Domain types and collaborator traits for Warden.
//!
//! The reversal engine in `warden_guard` is written purely against the traits in
//! this crate. Concrete adapters live elsewhere:
//! - `warden_discord` implements [`AuditTrail`], [`GuildSurface`] and
//!   [`NotificationSink`] on top of Serenity
//! - `warden_database` implements [`GuardRepository`] on top of Diesel

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod ids;
mod notice;
mod permissions;
mod records;
mod snapshot;
mod traits;

pub use event::{AuditOperation, GuardEvent};
pub use ids::Snowflake;
pub use notice::{AUTHORIZED_COLOR, BLOCKED_COLOR, Notice, NoticeField};
pub use permissions::{Capability, Standing, permission_bits};
pub use records::{
    AllowListEntry, AuditEntry, AuditEvent, GuardSource, LogCategory, PunishmentRecord,
    PunishmentType,
};
pub use snapshot::{
    ChannelEdit, ChannelKind, ChannelSnapshot, ChannelSpec, OverwriteTarget, PermissionOverwrite,
    RoleEdit, RoleSnapshot, RoleSpec, Snapshot,
};
pub use traits::{AuditTrail, GuardRepository, GuildSurface, NotificationSink, StoreResult};
