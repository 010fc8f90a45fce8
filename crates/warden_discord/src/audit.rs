//! Audit-log reads through the REST API.

use crate::conversions::{audit_action, to_datetime};
use crate::error::platform_error;
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::{debug, instrument};
use warden_error::PlatformResult;
use warden_interface::{AuditEntry, AuditOperation, AuditTrail, Snowflake};

/// [`AuditTrail`] over a guild's audit log.
#[derive(Clone)]
pub struct SerenityAuditTrail {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl SerenityAuditTrail {
    /// Read the audit log of `guild_id`.
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }
}

#[async_trait]
impl AuditTrail for SerenityAuditTrail {
    #[instrument(skip(self), fields(guild_id = %self.guild_id))]
    async fn query_recent(
        &self,
        operation: AuditOperation,
        limit: u8,
    ) -> PlatformResult<Vec<AuditEntry>> {
        let logs = self
            .guild_id
            .audit_logs(&self.http, Some(audit_action(operation)), None, None, Some(limit))
            .await
            .map_err(platform_error)?;

        let entries: Vec<AuditEntry> = logs
            .entries
            .into_iter()
            .map(|entry| AuditEntry {
                executor_id: Snowflake(entry.user_id.get()),
                target_id: entry.target_id.map(|id| Snowflake(id.get())),
                reason: entry.reason,
                timestamp: to_datetime(entry.id.created_at()),
            })
            .collect();
        debug!(count = entries.len(), "Audit entries fetched");
        Ok(entries)
    }
}
