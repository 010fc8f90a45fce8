//! Resolving the executor of a mutation from the audit log.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};
use warden_error::{GuardError, GuardErrorKind, GuardResult};
use warden_interface::{AuditEntry, AuditOperation, AuditTrail, GuardEvent, Snowflake};

/// Who performed a mutation, according to the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationResult {
    /// Account that performed the mutation
    pub executor_id: Snowflake,
    /// Entity the audit entry targets
    pub target_id: Option<Snowflake>,
    /// Reason recorded with the entry
    pub reason: Option<String>,
    /// When the entry was written
    pub entry_timestamp: DateTime<Utc>,
}

/// Matches gateway events to audit-log entries.
///
/// The audit log lags the gateway, so every lookup waits a fixed settling
/// delay first. There is no retry: if the entry has not appeared by then the
/// event is abandoned.
#[derive(Clone)]
pub struct AuditCorrelator {
    trail: Arc<dyn AuditTrail>,
    own_id: Snowflake,
    settle_delay: Duration,
    limit: u8,
}

impl AuditCorrelator {
    /// Create a correlator for the guard account `own_id`.
    pub fn new(
        trail: Arc<dyn AuditTrail>,
        own_id: Snowflake,
        settle_delay: Duration,
        limit: u8,
    ) -> Self {
        Self {
            trail,
            own_id,
            settle_delay,
            limit: limit.max(1),
        }
    }

    /// Wait out the settling delay, then read the newest entry logged under
    /// any of `operations`.
    ///
    /// # Errors
    ///
    /// - [`GuardErrorKind::MissingCorrelation`] when no entry is returned (or
    ///   the audit log cannot be read)
    /// - [`GuardErrorKind::MismatchedCorrelation`] when an update-type event's
    ///   entry targets a different entity
    /// - [`GuardErrorKind::SelfAction`] when the guard itself is the executor
    #[instrument(skip(self, event, operations), fields(operation = %event.operation(), subject = %event.subject()))]
    pub async fn correlate(
        &self,
        event: &GuardEvent,
        operations: &[AuditOperation],
    ) -> GuardResult<CorrelationResult> {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let mut newest: Option<AuditEntry> = None;
        for &operation in operations {
            let entries = match self.trail.query_recent(operation, self.limit).await {
                Ok(entries) => entries,
                Err(e) => {
                    error!(error = %e, operation = %operation, "Audit log query failed");
                    continue;
                }
            };
            let Some(entry) = entries.into_iter().next() else {
                continue;
            };
            if newest.as_ref().is_none_or(|n| entry.timestamp > n.timestamp) {
                newest = Some(entry);
            }
        }

        let Some(entry) = newest else {
            let names: Vec<String> = operations.iter().map(ToString::to_string).collect();
            return Err(GuardError::new(GuardErrorKind::MissingCorrelation {
                operation: names.join("|"),
            }));
        };

        let subject = event.subject();
        if event.requires_target_match() && entry.target_id != Some(subject) {
            return Err(GuardError::new(GuardErrorKind::MismatchedCorrelation {
                expected: subject.get(),
                found: entry.target_id.map(Snowflake::get).unwrap_or_default(),
            }));
        }

        if entry.executor_id == self.own_id {
            return Err(GuardError::new(GuardErrorKind::SelfAction));
        }

        debug!(executor = %entry.executor_id, "Correlated audit entry");
        Ok(CorrelationResult {
            executor_id: entry.executor_id,
            target_id: entry.target_id,
            reason: entry.reason,
            entry_timestamp: entry.timestamp,
        })
    }
}
