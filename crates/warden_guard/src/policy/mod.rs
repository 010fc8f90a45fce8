//! Per-entity-class guard policies.
//!
//! The engine owns the control flow (correlate, authorize, remediate, punish,
//! record). A policy supplies only what differs between entity classes: which
//! events it handles, what its cache holds, and how a mutation is reversed.

mod ban;
mod channel;
mod role;

pub use ban::{BanPolicy, BannedUser};
pub use channel::ChannelPolicy;
pub use role::RolePolicy;

use crate::StateCache;
use async_trait::async_trait;
use warden_error::PlatformResult;
use warden_interface::{
    AuditOperation, GuardEvent, GuardSource, GuildSurface, LogCategory, Snapshot,
};

/// Why an event ended without a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IgnoreReason {
    /// The policy does not handle this event kind.
    #[display("event not handled by this guard")]
    OutOfScope,
    /// The update changed none of the protected attributes.
    #[display("no protected attribute changed")]
    NoChange,
    /// An update arrived with no prior state in the event or the cache.
    #[display("no prior state to compare against")]
    NoPriorState,
    /// No audit entry after the settling delay.
    #[display("no matching audit entry")]
    MissingCorrelation,
    /// The newest audit entry concerns another entity.
    #[display("audit entry targets another entity")]
    MismatchedCorrelation,
    /// The guard caused the event itself.
    #[display("caused by the guard itself")]
    SelfAction,
    /// Unauthorized, but this kind of mutation is only observed.
    #[display("unauthorized mutation is observed only")]
    ObservedOnly,
}

/// How an in-scope event is labelled and recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventProfile {
    /// Notification grouping
    pub category: LogCategory,
    /// Action code recorded when the executor is authorized
    pub authorized_action: &'static str,
    /// Action code recorded when the mutation is blocked; `None` when an
    /// unauthorized mutation is left alone
    pub blocked_action: Option<&'static str>,
    /// Human-readable target, e.g. `#general` or `<@123>`
    pub target_label: String,
    /// One-line description of the mutation
    pub summary: String,
    /// What blocking does, e.g. `Channel recreated`
    pub remedy: &'static str,
}

/// Result of the pre-correlation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// Worth correlating.
    Proceed(EventProfile),
    /// Dropped before any audit-log query.
    Ignore(IgnoreReason),
}

/// What one guard protects and how it reverses unauthorized changes.
#[async_trait]
pub trait GuardPolicy: Send + Sync + 'static {
    /// What the state cache holds.
    type Snapshot: Snapshot;

    /// Label stamped on every record this guard produces.
    fn source(&self) -> GuardSource;

    /// Enumerate the protected entities for the initial cache load.
    async fn enumerate(&self, surface: &dyn GuildSurface) -> PlatformResult<Vec<Self::Snapshot>>;

    /// Decide whether `event` is in scope and actually changed something.
    ///
    /// Runs before the settling delay, so it must not do I/O.
    fn screen(&self, event: &GuardEvent, cache: &StateCache<Self::Snapshot>) -> Screening;

    /// Audit-log action types that may record the mutation behind `event`.
    ///
    /// Called after a successful screen and before the cache changes.
    fn audit_operations(
        &self,
        event: &GuardEvent,
        _cache: &StateCache<Self::Snapshot>,
    ) -> Vec<AuditOperation> {
        vec![event.operation()]
    }

    /// Reverse an unauthorized mutation.
    ///
    /// Leaves the cache holding the restored last-known-good state.
    async fn remediate(
        &self,
        event: &GuardEvent,
        cache: &mut StateCache<Self::Snapshot>,
        surface: &dyn GuildSurface,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Accept an authorized mutation into the cache.
    fn commit(&self, event: &GuardEvent, cache: &mut StateCache<Self::Snapshot>);
}
