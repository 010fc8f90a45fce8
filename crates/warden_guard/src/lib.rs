//! Audit-correlated reversal engine for unauthorized guild changes.
//!
//! Each protected entity class runs its own [`GuardEngine`]:
//! - **BanPolicy**: lifts unauthorized bans
//! - **ChannelPolicy**: deletes, recreates or reverts channels
//! - **RolePolicy**: deletes, recreates or reverts roles, restores member role
//!   sets and kicks unauthorized bots
//!
//! Every mutation is matched to its audit-log entry, the executor is checked
//! against the allow-list, and unauthorized executors are sanctioned by the
//! [`PunishmentEnforcer`]. Every decision is recorded by the [`LogEmitter`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod allow_list;
mod cache;
mod config;
mod controller;
mod correlator;
mod emitter;
mod enforcer;
mod engine;
mod memory;
mod oracle;
mod policy;
mod worker;

pub use allow_list::AllowList;
pub use cache::StateCache;
pub use config::{
    ConfigHandle, CorrelationSettings, GuardConfig, GuardConfigBuilder, LogChannels,
    PunishmentSettings,
};
pub use controller::{GuardController, SetupReport};
pub use correlator::{AuditCorrelator, CorrelationResult};
pub use emitter::{LogEmitter, render_notice};
pub use enforcer::PunishmentEnforcer;
pub use engine::{GuardEngine, GuardServices, Outcome};
pub use memory::MemoryRepository;
pub use oracle::AuthorizationOracle;
pub use policy::{
    BanPolicy, BannedUser, ChannelPolicy, EventProfile, GuardPolicy, IgnoreReason, RolePolicy,
    Screening,
};
pub use worker::{GuardMessage, GuardWorker, spawn_config_reload};
