//! Administrative operations behind the `warden` subcommands.

use crate::{AllowList, ConfigHandle, GuardServices, LogEmitter, PunishmentEnforcer, allow_list::persistence};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use warden_error::{GuardError, GuardErrorKind, GuardResult, PlatformError, WardenResult};
use warden_interface::{
    AuditEvent, ChannelKind, ChannelSpec, GuardRepository, GuardSource, GuildSurface, LogCategory,
    OverwriteTarget, PermissionOverwrite, PunishmentRecord, PunishmentType, Snowflake,
    permission_bits,
};

/// Channels touched by [`GuardController::setup_log_channels`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    /// Names created by this run, category first
    pub created: Vec<String>,
    /// Names that were already present and left alone
    pub existing: Vec<String>,
}

fn setup_failure(e: PlatformError) -> GuardError {
    GuardError::new(GuardErrorKind::SetupFailure(e.kind.to_string()))
}

/// Allow-list, punishment-mode and quarantine management.
pub struct GuardController {
    allow_list: AllowList,
    enforcer: PunishmentEnforcer,
    repository: Arc<dyn GuardRepository>,
    surface: Arc<dyn GuildSurface>,
    emitter: LogEmitter,
    config: ConfigHandle,
}

impl GuardController {
    /// Create a controller over the same collaborators the guards use.
    pub fn new(services: &GuardServices) -> Self {
        let emitter = services.emitter();
        Self {
            allow_list: AllowList::new(services.repository.clone(), emitter.clone()),
            enforcer: services.enforcer(),
            repository: services.repository.clone(),
            surface: services.surface.clone(),
            emitter,
            config: services.config.clone(),
        }
    }

    /// The allow-list manager.
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Punishment type currently in effect.
    pub fn punishment_type(&self) -> PunishmentType {
        self.config.punishment_type()
    }

    /// Switch the punishment type, persist it and record the change.
    ///
    /// Returns the previous type. Running guards pick the new one up on their
    /// next config reload.
    ///
    /// # Errors
    ///
    /// Returns the configuration error if the file cannot be rewritten; the
    /// in-memory mode has already changed by then.
    #[instrument(skip(self), fields(kind = %kind, changed_by = %changed_by))]
    pub async fn set_punishment_type(
        &self,
        kind: PunishmentType,
        changed_by: Snowflake,
    ) -> WardenResult<PunishmentType> {
        let previous = self.config.punishment_type();
        self.config.persist_punishment_type(kind)?;

        info!(from = %previous, "Punishment type changed");
        let event = AuditEvent::new(
            LogCategory::Permission,
            "PUNISHMENT_TYPE_CHANGED",
            GuardSource::Controller,
        )
        .with_executor_id(changed_by)
        .with_details(json!({
            "summary": format!("Punishment type changed from {} to {}", previous, kind),
            "previous": previous.to_string(),
            "current": kind.to_string(),
        }));
        self.emitter.record(event).await;
        Ok(previous)
    }

    /// Lift the quarantine on `subject`.
    ///
    /// # Errors
    ///
    /// See [`PunishmentEnforcer::release_quarantine`].
    pub async fn release_quarantine(
        &self,
        subject: Snowflake,
        released_by: Snowflake,
    ) -> GuardResult<()> {
        self.enforcer.release_quarantine(subject, released_by).await
    }

    /// Most recent audit events, newest first.
    pub async fn recent_events(&self, limit: i64) -> GuardResult<Vec<AuditEvent>> {
        self.repository
            .recent_audit_events(limit.max(1))
            .await
            .map_err(persistence)
    }

    /// Punishments applied to `subject`, newest first.
    pub async fn punishments_for(&self, subject: Snowflake) -> GuardResult<Vec<PunishmentRecord>> {
        self.repository
            .punishments_for(subject)
            .await
            .map_err(persistence)
    }

    /// Create the log category and its channels where missing.
    ///
    /// Everything is hidden from `@everyone`; the guard account may read and
    /// post in the channels. Existing channels of the same name under the
    /// category are skipped, so running this twice is harmless.
    ///
    /// # Errors
    ///
    /// [`GuardErrorKind::SetupFailure`] if the channel list cannot be read or
    /// a channel cannot be created. Channels created before the failure stay.
    #[instrument(skip(self))]
    pub async fn setup_log_channels(&self) -> GuardResult<SetupReport> {
        let (guild_id, names) = self
            .config
            .read(|config| (*config.guild_id(), config.log_channels().clone()));
        // @everyone shares the guild's id.
        let hidden = PermissionOverwrite {
            target: OverwriteTarget::Role(guild_id),
            allow: 0,
            deny: permission_bits::VIEW_CHANNEL,
        };
        let reason = "Warden: log channel setup";

        let channels = self.surface.list_channels().await.map_err(setup_failure)?;
        let mut report = SetupReport::default();

        let category = match channels
            .iter()
            .find(|c| c.kind == ChannelKind::Category && &c.name == names.category())
        {
            Some(category) => {
                report.existing.push(category.name.clone());
                category.id
            }
            None => {
                let spec = ChannelSpec {
                    name: names.category().clone(),
                    kind: ChannelKind::Category,
                    parent_id: None,
                    position: 0,
                    overwrites: vec![hidden],
                };
                let created = self
                    .surface
                    .create_channel(&spec, reason)
                    .await
                    .map_err(setup_failure)?;
                info!(category = %created.name, id = %created.id, "Log category created");
                report.created.push(created.name);
                created.id
            }
        };

        let writer = PermissionOverwrite {
            target: OverwriteTarget::Member(self.surface.own_id()),
            allow: permission_bits::VIEW_CHANNEL | permission_bits::SEND_MESSAGES,
            deny: 0,
        };
        for (position, name) in names.names().into_iter().enumerate() {
            if channels
                .iter()
                .any(|c| c.name == name && c.parent_id == Some(category))
            {
                report.existing.push(name.to_string());
                continue;
            }
            let spec = ChannelSpec {
                name: name.to_string(),
                kind: ChannelKind::Text,
                parent_id: Some(category),
                position: u16::try_from(position).unwrap_or(u16::MAX),
                overwrites: vec![hidden, writer],
            };
            self.surface
                .create_channel(&spec, reason)
                .await
                .map_err(setup_failure)?;
            info!(channel = %name, "Log channel created");
            report.created.push(name.to_string());
        }
        Ok(report)
    }
}
