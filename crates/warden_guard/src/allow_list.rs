//! Allow-list management.

use crate::LogEmitter;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use warden_error::{DatabaseError, DatabaseErrorKind, GuardError, GuardErrorKind, GuardResult};
use warden_interface::{
    AllowListEntry, AuditEvent, GuardRepository, GuardSource, LogCategory, Snowflake,
};

/// Grants and revokes authorization.
#[derive(Clone)]
pub struct AllowList {
    repository: Arc<dyn GuardRepository>,
    emitter: LogEmitter,
}

impl AllowList {
    /// Create an allow-list manager.
    pub fn new(repository: Arc<dyn GuardRepository>, emitter: LogEmitter) -> Self {
        Self { repository, emitter }
    }

    /// Authorize `subject`.
    ///
    /// An inactive entry left behind by another tool is replaced.
    ///
    /// # Errors
    ///
    /// - [`GuardErrorKind::AlreadyListed`] if an active entry exists
    /// - [`GuardErrorKind::Persistence`] if the store fails
    #[instrument(skip(self), fields(subject = %subject, granted_by = %granted_by))]
    pub async fn grant(
        &self,
        subject: Snowflake,
        granted_by: Snowflake,
    ) -> GuardResult<AllowListEntry> {
        match self.repository.find_allow_entry(subject).await.map_err(persistence)? {
            Some(entry) if entry.active => {
                return Err(GuardError::new(GuardErrorKind::AlreadyListed(subject.get())));
            }
            Some(_) => {
                self.repository
                    .delete_allow_entry(subject)
                    .await
                    .map_err(persistence)?;
            }
            None => {}
        }

        let entry = AllowListEntry::new(subject, Some(granted_by));
        self.repository
            .insert_allow_entry(&entry)
            .await
            .map_err(|e| match e.kind {
                DatabaseErrorKind::Duplicate(_) => {
                    GuardError::new(GuardErrorKind::AlreadyListed(subject.get()))
                }
                _ => persistence(e),
            })?;

        info!("Subject allow-listed");
        let event = AuditEvent::new(LogCategory::Permission, "WHITELIST_ADD", GuardSource::Controller)
            .with_executor_id(granted_by)
            .with_target_id(subject)
            .with_details(json!({
                "summary": format!("{} added {} to the allow-list", granted_by.mention(), subject.mention()),
                "target": subject.mention(),
            }));
        self.emitter.record(event).await;
        Ok(entry)
    }

    /// Remove `subject`'s authorization.
    ///
    /// # Errors
    ///
    /// - [`GuardErrorKind::NotListed`] if there is no entry
    /// - [`GuardErrorKind::Persistence`] if the store fails
    #[instrument(skip(self), fields(subject = %subject, revoked_by = %revoked_by))]
    pub async fn revoke(&self, subject: Snowflake, revoked_by: Snowflake) -> GuardResult<()> {
        let removed = self
            .repository
            .delete_allow_entry(subject)
            .await
            .map_err(persistence)?;
        if !removed {
            return Err(GuardError::new(GuardErrorKind::NotListed(subject.get())));
        }

        info!("Subject removed from allow-list");
        let event = AuditEvent::new(LogCategory::Permission, "WHITELIST_REMOVE", GuardSource::Controller)
            .with_executor_id(revoked_by)
            .with_target_id(subject)
            .with_details(json!({
                "summary": format!("{} removed {} from the allow-list", revoked_by.mention(), subject.mention()),
                "target": subject.mention(),
            }));
        self.emitter.record(event).await;
        Ok(())
    }

    /// Active entries, oldest grant first.
    pub async fn list(&self) -> GuardResult<Vec<AllowListEntry>> {
        self.repository
            .list_active_allow_entries()
            .await
            .map_err(persistence)
    }
}

#[track_caller]
pub(crate) fn persistence(e: DatabaseError) -> GuardError {
    GuardError::new(GuardErrorKind::Persistence(e.kind.to_string()))
}
