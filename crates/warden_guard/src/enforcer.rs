//! Sanctions against unauthorized executors.

use crate::{ConfigHandle, LogEmitter};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use warden_error::{GuardError, GuardErrorKind, GuardResult};
use warden_interface::{
    AuditEvent, GuardRepository, GuardSource, GuildSurface, LogCategory, OverwriteTarget,
    PermissionOverwrite, PunishmentRecord, PunishmentType, RoleSnapshot, RoleSpec, Snowflake,
    Standing, permission_bits,
};

/// Applies the configured sanction to an executor.
#[derive(Clone)]
pub struct PunishmentEnforcer {
    surface: Arc<dyn GuildSurface>,
    repository: Arc<dyn GuardRepository>,
    emitter: LogEmitter,
    config: ConfigHandle,
}

impl PunishmentEnforcer {
    /// Create an enforcer.
    pub fn new(
        surface: Arc<dyn GuildSurface>,
        repository: Arc<dyn GuardRepository>,
        emitter: LogEmitter,
        config: ConfigHandle,
    ) -> Self {
        Self {
            surface,
            repository,
            emitter,
            config,
        }
    }

    /// Sanction `subject` for `cause` (an action code such as
    /// `ROLE_CREATE_BLOCKED`).
    ///
    /// `kind` defaults to the configured punishment type, read at call time.
    /// A [`PunishmentRecord`] is written only when the sanction was applied.
    ///
    /// # Errors
    ///
    /// Returns the failed precondition or platform error. A `PUNISHMENT_FAILED`
    /// audit event has already been emitted by the time the error is returned,
    /// so callers only need to log it.
    #[instrument(skip(self, detail), fields(subject = %subject, source = %source))]
    pub async fn punish(
        &self,
        subject: Snowflake,
        source: GuardSource,
        cause: &str,
        detail: &str,
        kind: Option<PunishmentType>,
    ) -> GuardResult<PunishmentType> {
        let kind = kind.unwrap_or_else(|| self.config.punishment_type());

        if let Err(e) = self.apply(subject, kind, cause).await {
            warn!(kind = %kind, error = %e, "Punishment not applied");
            let event = AuditEvent::new(LogCategory::Security, "PUNISHMENT_FAILED", source)
                .with_target_id(subject)
                .with_details(json!({
                    "summary": format!("Could not apply {} to {}", kind, subject.mention()),
                    "target": subject.mention(),
                    "reason": e.kind().to_string(),
                    "cause": cause,
                }));
            self.emitter.record(event).await;
            return Err(e);
        }

        info!(kind = %kind, "Punishment applied");
        let record = PunishmentRecord::new(subject, source, cause, kind).with_reason(detail);
        if let Err(e) = self.repository.insert_punishment(&record).await {
            error!(error = %e, "Failed to store punishment record");
        }
        Ok(kind)
    }

    async fn apply(&self, subject: Snowflake, kind: PunishmentType, cause: &str) -> GuardResult<()> {
        let reason = format!("Warden: {}", cause);
        let own = self.surface.own_standing().await.map_err(sanction_error)?;

        if let Some(capability) = kind.required_capability() {
            if !own.has(capability) {
                return Err(GuardError::new(GuardErrorKind::InsufficientCapability {
                    action: kind.to_string(),
                    capability: capability.to_string(),
                }));
            }
        }

        let standing = self
            .surface
            .member_standing(subject)
            .await
            .map_err(sanction_error)?;
        match standing {
            Some(standing) => check_hierarchy(kind, &own, &standing)?,
            // A ban does not need the subject to still be in the guild.
            None if kind == PunishmentType::Ban || kind == PunishmentType::Warn => {}
            None => return Err(GuardError::new(GuardErrorKind::NotAMember(subject.get()))),
        }

        let result = match kind {
            PunishmentType::Quarantine => {
                let role = self.ensure_quarantine_role().await?;
                self.surface.set_member_roles(subject, &[role.id], &reason).await
            }
            PunishmentType::RoleRemove => self.surface.set_member_roles(subject, &[], &reason).await,
            PunishmentType::Kick => self.surface.kick(subject, &reason).await,
            PunishmentType::Ban => self.surface.ban(subject, &reason).await,
            PunishmentType::Timeout => {
                let minutes = self.config.read(|c| *c.punishment().timeout_minutes());
                let until = Utc::now() + chrono::Duration::minutes(i64::from(minutes));
                self.surface.timeout(subject, until, &reason).await
            }
            PunishmentType::Warn => Ok(()),
        };
        result.map_err(sanction_error)
    }

    /// Find the quarantine role, creating it on first use.
    ///
    /// A new role gets a deny overwrite on every text and voice channel that
    /// exists at creation time. Channels created later are not updated.
    #[instrument(skip(self))]
    pub async fn ensure_quarantine_role(&self) -> GuardResult<RoleSnapshot> {
        let name = self.quarantine_role_name();
        if let Some(role) = self
            .surface
            .find_role_by_name(&name)
            .await
            .map_err(sanction_error)?
        {
            return Ok(role);
        }

        let spec = RoleSpec {
            name: name.clone(),
            color: 0,
            permissions: 0,
            hoist: false,
            mentionable: false,
        };
        let role = self
            .surface
            .create_role(&spec, "Warden: quarantine role created")
            .await
            .map_err(sanction_error)?;
        info!(role = %role.id, "Quarantine role created");

        let channels = self.surface.list_channels().await.map_err(sanction_error)?;
        let overwrite = PermissionOverwrite {
            target: OverwriteTarget::Role(role.id),
            allow: 0,
            deny: permission_bits::QUARANTINE_DENY,
        };
        for channel in channels.iter().filter(|c| c.kind.is_text_or_voice()) {
            if let Err(e) = self
                .surface
                .add_channel_overwrite(channel.id, overwrite, "Warden: quarantine role created")
                .await
            {
                warn!(channel = %channel.id, error = %e, "Failed to restrict channel for quarantine");
            }
        }
        Ok(role)
    }

    /// Take the quarantine role off `subject`.
    ///
    /// # Errors
    ///
    /// - [`GuardErrorKind::NotQuarantined`] if the role does not exist or the
    ///   member does not hold it
    /// - [`GuardErrorKind::NotAMember`] if the subject is not in the guild
    #[instrument(skip(self), fields(subject = %subject, released_by = %released_by))]
    pub async fn release_quarantine(
        &self,
        subject: Snowflake,
        released_by: Snowflake,
    ) -> GuardResult<()> {
        let name = self.quarantine_role_name();
        let role = self
            .surface
            .find_role_by_name(&name)
            .await
            .map_err(sanction_error)?
            .ok_or_else(|| GuardError::new(GuardErrorKind::NotQuarantined(subject.get())))?;

        let roles = self
            .surface
            .member_roles(subject)
            .await
            .map_err(sanction_error)?
            .ok_or_else(|| GuardError::new(GuardErrorKind::NotAMember(subject.get())))?;
        if !roles.contains(&role.id) {
            return Err(GuardError::new(GuardErrorKind::NotQuarantined(subject.get())));
        }

        let reason = format!("Warden: quarantine lifted by {}", released_by);
        self.surface
            .remove_member_role(subject, role.id, &reason)
            .await
            .map_err(sanction_error)?;

        info!("Quarantine lifted");
        let event = AuditEvent::new(LogCategory::Permission, "QUARANTINE_REMOVED", GuardSource::Controller)
            .with_executor_id(released_by)
            .with_target_id(subject)
            .with_details(json!({
                "summary": format!("{} lifted the quarantine on {}", released_by.mention(), subject.mention()),
                "target": subject.mention(),
            }));
        self.emitter.record(event).await;
        Ok(())
    }

    fn quarantine_role_name(&self) -> String {
        self.config
            .read(|c| c.punishment().quarantine_role_name().clone())
    }
}

fn check_hierarchy(kind: PunishmentType, own: &Standing, subject: &Standing) -> GuardResult<()> {
    if kind.checks_hierarchy() && !own.outranks(subject) {
        return Err(GuardError::new(GuardErrorKind::HierarchyViolation {
            subject_rank: subject.rank,
            guard_rank: own.rank,
        }));
    }
    Ok(())
}

#[track_caller]
fn sanction_error(e: warden_error::PlatformError) -> GuardError {
    GuardError::new(GuardErrorKind::SanctionFailure(e.kind.to_string()))
}
