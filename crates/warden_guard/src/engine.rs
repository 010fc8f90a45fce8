//! The reversal engine.
//!
//! One [`GuardEngine`] runs per protected entity class. It owns that class's
//! [`StateCache`] and is its only writer; the policy object supplies what
//! differs between classes.

use crate::{
    AuditCorrelator, AuthorizationOracle, ConfigHandle, GuardPolicy, IgnoreReason, LogEmitter,
    PunishmentEnforcer, Screening, StateCache,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use warden_error::{GuardError, GuardErrorKind, PlatformResult};
use warden_interface::{
    AuditEvent, AuditTrail, GuardEvent, GuardRepository, GuildSurface, NotificationSink,
};

/// Terminal state of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Outcome {
    /// Dropped without a decision.
    #[display("ignored ({})", _0)]
    Ignored(IgnoreReason),
    /// Performed by an authorized account and accepted.
    #[display("authorized")]
    Authorized,
    /// Unauthorized and reversed.
    #[display("reverted")]
    Reverted,
    /// Unauthorized, but the reversal call failed. The executor was still
    /// sanctioned and the block recorded.
    #[display("revert failed")]
    RevertFailed,
}

/// Collaborators shared by every engine in a process.
#[derive(Clone)]
pub struct GuardServices {
    /// Remedial API surface
    pub surface: Arc<dyn GuildSurface>,
    /// Audit-log reader
    pub trail: Arc<dyn AuditTrail>,
    /// Durable store
    pub repository: Arc<dyn GuardRepository>,
    /// Notification channel, if any
    pub sink: Option<Arc<dyn NotificationSink>>,
    /// Live configuration
    pub config: ConfigHandle,
}

impl GuardServices {
    /// The emitter every component of one engine records through.
    pub fn emitter(&self) -> LogEmitter {
        LogEmitter::new(self.repository.clone(), self.sink.clone(), self.config.clone())
    }

    /// An enforcer over these collaborators.
    pub fn enforcer(&self) -> PunishmentEnforcer {
        PunishmentEnforcer::new(
            self.surface.clone(),
            self.repository.clone(),
            self.emitter(),
            self.config.clone(),
        )
    }
}

/// Correlate, authorize and, where needed, reverse mutations for one entity class.
pub struct GuardEngine<P: GuardPolicy> {
    policy: P,
    cache: StateCache<P::Snapshot>,
    surface: Arc<dyn GuildSurface>,
    correlator: AuditCorrelator,
    oracle: AuthorizationOracle,
    enforcer: PunishmentEnforcer,
    emitter: LogEmitter,
}

impl<P: GuardPolicy> GuardEngine<P> {
    /// Create an engine with an empty cache. Call [`Self::prime`] before
    /// handling live events.
    pub fn new(policy: P, services: &GuardServices) -> Self {
        let correlation = services.config.read(|config| *config.correlation());
        let correlator = AuditCorrelator::new(
            services.trail.clone(),
            services.surface.own_id(),
            correlation.settle_delay(),
            *correlation.audit_limit(),
        );
        Self {
            policy,
            cache: StateCache::new(),
            surface: services.surface.clone(),
            correlator,
            oracle: AuthorizationOracle::new(services.repository.clone(), services.config.clone()),
            enforcer: services.enforcer(),
            emitter: services.emitter(),
        }
    }

    /// The policy this engine runs.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Last known-good state of the protected entities.
    pub fn cache(&self) -> &StateCache<P::Snapshot> {
        &self.cache
    }

    /// Load the cache from the live guild.
    ///
    /// # Errors
    ///
    /// Returns the platform error if enumeration fails; the cache is left
    /// untouched in that case.
    #[instrument(skip(self), fields(guard = %self.policy.source()))]
    pub async fn prime(&mut self) -> PlatformResult<usize> {
        let snapshots = self.policy.enumerate(self.surface.as_ref()).await?;
        self.cache.load(snapshots);
        info!(entries = self.cache.len(), "State cache primed");
        Ok(self.cache.len())
    }

    /// Run one event to its terminal state.
    ///
    /// Never fails: every error along the way is logged and folded into the
    /// returned [`Outcome`].
    #[instrument(
        skip(self, event),
        fields(guard = %self.policy.source(), operation = %event.operation(), target = %event.subject())
    )]
    pub async fn handle(&mut self, event: &GuardEvent) -> Outcome {
        let profile = match self.policy.screen(event, &self.cache) {
            Screening::Proceed(profile) => profile,
            Screening::Ignore(reason) => {
                debug!(reason = %reason, "Event ignored");
                return Outcome::Ignored(reason);
            }
        };

        let operations = self.policy.audit_operations(event, &self.cache);
        let correlation = match self.correlator.correlate(event, &operations).await {
            Ok(correlation) => correlation,
            Err(e) => return Outcome::Ignored(abandon(&e)),
        };
        let executor = correlation.executor_id;
        let source = self.policy.source();
        let audit_reason = correlation.reason.unwrap_or_default();

        if self.oracle.is_authorized(executor).await {
            self.oracle.record_liveness(executor).await;
            self.policy.commit(event, &mut self.cache);
            info!(executor = %executor, action = profile.authorized_action, "Authorized mutation accepted");
            let record = AuditEvent::new(profile.category, profile.authorized_action, source)
                .with_executor_id(executor)
                .with_target_id(event.subject())
                .with_details(json!({
                    "summary": profile.summary,
                    "target": profile.target_label,
                    "reason": audit_reason,
                }));
            self.emitter.record(record).await;
            return Outcome::Authorized;
        }

        let Some(blocked_action) = profile.blocked_action else {
            info!(executor = %executor, "Unauthorized mutation observed, not reversed");
            return Outcome::Ignored(IgnoreReason::ObservedOnly);
        };

        warn!(executor = %executor, action = blocked_action, "Unauthorized mutation, reversing");
        let reason = format!("Warden: {} by {}", blocked_action, executor);
        let (outcome, remedy) = match self
            .policy
            .remediate(event, &mut self.cache, self.surface.as_ref(), &reason)
            .await
        {
            Ok(()) => (Outcome::Reverted, profile.remedy.to_string()),
            Err(e) => {
                let e = GuardError::new(GuardErrorKind::RevertFailure(e.kind.to_string()));
                error!(error = %e, "Reversal failed, sanctioning executor anyway");
                (Outcome::RevertFailed, e.kind().to_string())
            }
        };

        let punishment = match self
            .enforcer
            .punish(executor, source, blocked_action, &profile.summary, None)
            .await
        {
            Ok(kind) => format!("executor punished ({})", kind),
            Err(_) => "punishment failed".to_string(),
        };

        let record = AuditEvent::new(profile.category, blocked_action, source)
            .with_executor_id(executor)
            .with_target_id(event.subject())
            .with_was_blocked(true)
            .with_details(json!({
                "summary": profile.summary,
                "target": profile.target_label,
                "remedy": format!("{}; {}", remedy, punishment),
                "reason": audit_reason,
                "reverted": outcome == Outcome::Reverted,
            }));
        self.emitter.record(record).await;
        outcome
    }
}

/// Log a failed correlation once and name it.
fn abandon(e: &GuardError) -> IgnoreReason {
    match e.kind() {
        GuardErrorKind::SelfAction => {
            debug!("Event caused by the guard itself");
            IgnoreReason::SelfAction
        }
        GuardErrorKind::MismatchedCorrelation { .. } => {
            debug!(error = %e, "Audit entry does not match event");
            IgnoreReason::MismatchedCorrelation
        }
        _ => {
            warn!(error = %e, "Event dropped without correlation");
            IgnoreReason::MissingCorrelation
        }
    }
}
