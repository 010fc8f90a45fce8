use super::{EventProfile, GuardPolicy, IgnoreReason, Screening};
use crate::StateCache;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, warn};
use warden_error::{PlatformError, PlatformResult};
use warden_interface::{
    AuditOperation, ChannelEdit, ChannelSnapshot, GuardEvent, GuardSource, GuildSurface,
    LogCategory, OverwriteTarget, PermissionOverwrite,
};

/// Channel protection: creations are deleted, deletions recreated from the
/// cache and edits written back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelPolicy;

impl ChannelPolicy {
    /// Prior state of an updated channel: the event's, else the cache's.
    fn prior<'a>(
        before: &'a Option<ChannelSnapshot>,
        after: &ChannelSnapshot,
        cache: &'a StateCache<ChannelSnapshot>,
    ) -> Option<&'a ChannelSnapshot> {
        before.as_ref().or_else(|| cache.get(after.id))
    }
}

/// Fields of `after` that differ from `prior`, set back to `prior`'s values.
pub(crate) fn revert_edit(prior: &ChannelSnapshot, after: &ChannelSnapshot) -> ChannelEdit {
    ChannelEdit {
        name: (prior.name != after.name).then(|| prior.name.clone()),
        overwrites: (prior.sorted_overwrites() != after.sorted_overwrites())
            .then(|| prior.overwrites.clone()),
    }
}

/// Audit action types under which an edit from `prior` to `after` is logged.
///
/// Renames are `CHANNEL_UPDATE`; each overwrite added, changed or removed gets
/// its own `CHANNEL_OVERWRITE_*` entry.
pub(crate) fn edit_operations(prior: &ChannelSnapshot, after: &ChannelSnapshot) -> Vec<AuditOperation> {
    fn by_target(overwrites: &[PermissionOverwrite]) -> BTreeMap<OverwriteTarget, (u64, u64)> {
        overwrites.iter().map(|o| (o.target, (o.allow, o.deny))).collect()
    }

    let old = by_target(&prior.overwrites);
    let new = by_target(&after.overwrites);
    let mut operations = Vec::new();
    if prior.name != after.name {
        operations.push(AuditOperation::ChannelUpdate);
    }
    if new.keys().any(|target| !old.contains_key(target)) {
        operations.push(AuditOperation::ChannelOverwriteCreate);
    }
    if new
        .iter()
        .any(|(target, bits)| old.get(target).is_some_and(|old_bits| old_bits != bits))
    {
        operations.push(AuditOperation::ChannelOverwriteUpdate);
    }
    if old.keys().any(|target| !new.contains_key(target)) {
        operations.push(AuditOperation::ChannelOverwriteDelete);
    }
    if operations.is_empty() {
        operations.push(AuditOperation::ChannelUpdate);
    }
    operations
}

fn changed_fields(edit: &ChannelEdit) -> String {
    let mut fields = Vec::new();
    if edit.name.is_some() {
        fields.push("name");
    }
    if edit.overwrites.is_some() {
        fields.push("permissions");
    }
    fields.join(", ")
}

#[async_trait]
impl GuardPolicy for ChannelPolicy {
    type Snapshot = ChannelSnapshot;

    fn source(&self) -> GuardSource {
        GuardSource::Channel
    }

    async fn enumerate(&self, surface: &dyn GuildSurface) -> PlatformResult<Vec<ChannelSnapshot>> {
        surface.list_channels().await
    }

    fn screen(&self, event: &GuardEvent, cache: &StateCache<ChannelSnapshot>) -> Screening {
        match event {
            GuardEvent::ChannelCreated { channel } => Screening::Proceed(EventProfile {
                category: LogCategory::Channel,
                authorized_action: "CHANNEL_CREATE_AUTHORIZED",
                blocked_action: Some("CHANNEL_CREATE_BLOCKED"),
                target_label: format!("#{}", channel.name),
                summary: format!("Channel #{} created", channel.name),
                remedy: "Channel deleted",
            }),
            GuardEvent::ChannelDeleted { channel } => Screening::Proceed(EventProfile {
                category: LogCategory::Channel,
                authorized_action: "CHANNEL_DELETE_AUTHORIZED",
                blocked_action: Some("CHANNEL_DELETE_BLOCKED"),
                target_label: format!("#{}", channel.name),
                summary: format!("Channel #{} deleted", channel.name),
                remedy: if cache.contains(channel.id) {
                    "Channel recreated"
                } else {
                    "No snapshot to restore"
                },
            }),
            GuardEvent::ChannelUpdated { before, after } => {
                let Some(prior) = Self::prior(before, after, cache) else {
                    return Screening::Ignore(IgnoreReason::NoPriorState);
                };
                let edit = revert_edit(prior, after);
                if edit.is_empty() {
                    return Screening::Ignore(IgnoreReason::NoChange);
                }
                Screening::Proceed(EventProfile {
                    category: LogCategory::Channel,
                    authorized_action: "CHANNEL_UPDATE_AUTHORIZED",
                    blocked_action: Some("CHANNEL_UPDATE_BLOCKED"),
                    target_label: format!("#{}", prior.name),
                    summary: format!("Channel #{} updated ({})", prior.name, changed_fields(&edit)),
                    remedy: "Changes reverted",
                })
            }
            _ => Screening::Ignore(IgnoreReason::OutOfScope),
        }
    }

    fn audit_operations(
        &self,
        event: &GuardEvent,
        cache: &StateCache<ChannelSnapshot>,
    ) -> Vec<AuditOperation> {
        match event {
            GuardEvent::ChannelUpdated { before, after } => Self::prior(before, after, cache)
                .map(|prior| edit_operations(prior, after))
                .unwrap_or_else(|| vec![event.operation()]),
            other => vec![other.operation()],
        }
    }

    async fn remediate(
        &self,
        event: &GuardEvent,
        cache: &mut StateCache<ChannelSnapshot>,
        surface: &dyn GuildSurface,
        reason: &str,
    ) -> PlatformResult<()> {
        match event {
            GuardEvent::ChannelCreated { channel } => surface.delete_channel(channel.id, reason).await,
            GuardEvent::ChannelDeleted { channel } => {
                let Some(snapshot) = cache.get(channel.id).cloned() else {
                    warn!(channel = %channel.id, "No cached snapshot, channel cannot be recreated");
                    return Ok(());
                };
                let recreated = surface.create_channel(&snapshot.to_spec(), reason).await?;
                info!(old = %channel.id, new = %recreated.id, "Channel recreated");
                cache.replace(channel.id, recreated);
                Ok(())
            }
            GuardEvent::ChannelUpdated { before, after } => {
                let Some(prior) = Self::prior(before, after, cache).cloned() else {
                    return Err(PlatformError::api("no prior channel state to restore"));
                };
                let edit = revert_edit(&prior, after);
                surface.edit_channel(after.id, &edit, reason).await?;
                cache.put(prior);
                Ok(())
            }
            other => Err(PlatformError::api(format!(
                "channel guard cannot remediate {}",
                other.operation()
            ))),
        }
    }

    fn commit(&self, event: &GuardEvent, cache: &mut StateCache<ChannelSnapshot>) {
        match event {
            GuardEvent::ChannelCreated { channel } => cache.put(channel.clone()),
            GuardEvent::ChannelDeleted { channel } => {
                cache.remove(channel.id);
            }
            GuardEvent::ChannelUpdated { after, .. } => cache.put(after.clone()),
            _ => {}
        }
    }
}
