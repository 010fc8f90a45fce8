//! Serenity adapters for Warden.
//!
//! Implements the platform traits of `warden_interface` against the Discord
//! REST API and turns gateway events into
//! [`GuardEvent`](warden_interface::GuardEvent)s for a guard worker.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod client;
mod conversions;
mod error;
mod handler;
mod sink;
mod surface;

pub use audit::SerenityAuditTrail;
pub use client::WardenBot;
pub use conversions::{
    audit_action, channel_kind, channel_snapshot, channel_type, role_snapshot, to_datetime,
    to_timestamp,
};
pub use error::{is_not_found, platform_error};
pub use handler::{WardenHandler, event_source};
pub use sink::DiscordSink;
pub use surface::SerenityGuild;

/// Serenity types callers need to wire a guard.
pub use serenity::{http::Http, model::id::GuildId};
