//! Allow-list lookups.

use crate::ConfigHandle;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, instrument};
use warden_interface::{GuardRepository, Snowflake};

/// Answers whether an account may perform privileged mutations.
#[derive(Clone)]
pub struct AuthorizationOracle {
    repository: Arc<dyn GuardRepository>,
    config: ConfigHandle,
}

impl AuthorizationOracle {
    /// Create an oracle over the allow-list store and the configured system accounts.
    pub fn new(repository: Arc<dyn GuardRepository>, config: ConfigHandle) -> Self {
        Self { repository, config }
    }

    /// True for system accounts and for subjects with an active allow-list entry.
    ///
    /// Every call is a point lookup. If the store cannot be read the subject
    /// is treated as unauthorized.
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn is_authorized(&self, subject: Snowflake) -> bool {
        if self.config.read(|config| config.is_system_account(subject)) {
            return true;
        }
        match self.repository.find_allow_entry(subject).await {
            Ok(entry) => entry.is_some_and(|entry| entry.active),
            Err(e) => {
                error!(error = %e, "Allow-list lookup failed, treating subject as unauthorized");
                false
            }
        }
    }

    /// Stamp the subject's last authorized activity.
    pub async fn record_liveness(&self, subject: Snowflake) {
        if let Err(e) = self.repository.touch_last_seen(subject, Utc::now()).await {
            error!(subject = %subject, error = %e, "Failed to record last seen");
        }
    }
}
