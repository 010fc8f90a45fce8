use super::{EventProfile, GuardPolicy, IgnoreReason, Screening};
use crate::StateCache;
use async_trait::async_trait;
use tracing::{info, warn};
use warden_error::{PlatformError, PlatformResult};
use warden_interface::{
    GuardEvent, GuardSource, GuildSurface, LogCategory, RoleEdit, RoleSnapshot, Snowflake,
};

/// Role protection.
///
/// Covers role creation, deletion and edits, changes to a member's role set
/// and bot accounts joining the guild.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

/// Fields of `after` that differ from `prior`, set back to `prior`'s values.
///
/// Position is not protected.
pub(crate) fn revert_edit(prior: &RoleSnapshot, after: &RoleSnapshot) -> RoleEdit {
    RoleEdit {
        name: (prior.name != after.name).then(|| prior.name.clone()),
        color: (prior.color != after.color).then_some(prior.color),
        permissions: (prior.permissions != after.permissions).then_some(prior.permissions),
        hoist: (prior.hoist != after.hoist).then_some(prior.hoist),
        mentionable: (prior.mentionable != after.mentionable).then_some(prior.mentionable),
    }
}

fn changed_fields(edit: &RoleEdit) -> String {
    [
        (edit.name.is_some(), "name"),
        (edit.permissions.is_some(), "permissions"),
        (edit.color.is_some(), "color"),
        (edit.hoist.is_some(), "hoist"),
        (edit.mentionable.is_some(), "mentionable"),
    ]
    .into_iter()
    .filter_map(|(changed, field)| changed.then_some(field))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Roles gained and lost between two role sets.
fn role_delta(before: &[Snowflake], after: &[Snowflake]) -> (Vec<Snowflake>, Vec<Snowflake>) {
    let added = after.iter().filter(|r| !before.contains(r)).copied().collect();
    let removed = before.iter().filter(|r| !after.contains(r)).copied().collect();
    (added, removed)
}

fn role_mentions(roles: &[Snowflake]) -> String {
    roles
        .iter()
        .map(|r| format!("<@&{}>", r))
        .collect::<Vec<_>>()
        .join(" ")
}

fn prior<'a>(
    before: &'a Option<RoleSnapshot>,
    after: &RoleSnapshot,
    cache: &'a StateCache<RoleSnapshot>,
) -> Option<&'a RoleSnapshot> {
    before.as_ref().or_else(|| cache.get(after.id))
}

#[async_trait]
impl GuardPolicy for RolePolicy {
    type Snapshot = RoleSnapshot;

    fn source(&self) -> GuardSource {
        GuardSource::Role
    }

    async fn enumerate(&self, surface: &dyn GuildSurface) -> PlatformResult<Vec<RoleSnapshot>> {
        surface.list_roles().await
    }

    fn screen(&self, event: &GuardEvent, cache: &StateCache<RoleSnapshot>) -> Screening {
        match event {
            GuardEvent::RoleCreated { role } => Screening::Proceed(EventProfile {
                category: LogCategory::Role,
                authorized_action: "ROLE_CREATE_AUTHORIZED",
                blocked_action: Some("ROLE_CREATE_BLOCKED"),
                target_label: format!("@{}", role.name),
                summary: format!("Role @{} created", role.name),
                remedy: "Role deleted",
            }),
            GuardEvent::RoleDeleted { role_id, role } => {
                let name = cache
                    .get(*role_id)
                    .map(|r| r.name.clone())
                    .or_else(|| role.as_ref().map(|r| r.name.clone()))
                    .unwrap_or_else(|| role_id.to_string());
                Screening::Proceed(EventProfile {
                    category: LogCategory::Role,
                    authorized_action: "ROLE_DELETE_AUTHORIZED",
                    blocked_action: Some("ROLE_DELETE_BLOCKED"),
                    target_label: format!("@{}", name),
                    summary: format!("Role @{} deleted", name),
                    remedy: if cache.contains(*role_id) {
                        "Role recreated"
                    } else {
                        "No snapshot to restore"
                    },
                })
            }
            GuardEvent::RoleUpdated { before, after } => {
                let Some(prior) = prior(before, after, cache) else {
                    return Screening::Ignore(IgnoreReason::NoPriorState);
                };
                let edit = revert_edit(prior, after);
                if edit.is_empty() {
                    return Screening::Ignore(IgnoreReason::NoChange);
                }
                Screening::Proceed(EventProfile {
                    category: LogCategory::Role,
                    authorized_action: "ROLE_UPDATE_AUTHORIZED",
                    blocked_action: Some("ROLE_UPDATE_BLOCKED"),
                    target_label: format!("@{}", prior.name),
                    summary: format!("Role @{} updated ({})", prior.name, changed_fields(&edit)),
                    remedy: "Changes reverted",
                })
            }
            GuardEvent::MemberRolesUpdated {
                member,
                before,
                after,
            } => {
                let Some(before) = before else {
                    return Screening::Ignore(IgnoreReason::NoPriorState);
                };
                let (added, removed) = role_delta(before, after);
                if added.is_empty() && removed.is_empty() {
                    return Screening::Ignore(IgnoreReason::NoChange);
                }
                let mut changes = Vec::new();
                if !added.is_empty() {
                    changes.push(format!("added {}", role_mentions(&added)));
                }
                if !removed.is_empty() {
                    changes.push(format!("removed {}", role_mentions(&removed)));
                }
                Screening::Proceed(EventProfile {
                    category: LogCategory::Role,
                    authorized_action: "MEMBER_ROLE_UPDATE_AUTHORIZED",
                    blocked_action: Some("MEMBER_ROLE_UPDATE_BLOCKED"),
                    target_label: member.mention(),
                    summary: format!("Roles of {} changed: {}", member.mention(), changes.join("; ")),
                    remedy: "Roles restored",
                })
            }
            GuardEvent::BotAdded { bot } => Screening::Proceed(EventProfile {
                category: LogCategory::BotAdd,
                authorized_action: "BOT_ADD_AUTHORIZED",
                blocked_action: Some("BOT_ADD_BLOCKED"),
                target_label: bot.mention(),
                summary: format!("Bot {} was added", bot.mention()),
                remedy: "Bot kicked",
            }),
            _ => Screening::Ignore(IgnoreReason::OutOfScope),
        }
    }

    async fn remediate(
        &self,
        event: &GuardEvent,
        cache: &mut StateCache<RoleSnapshot>,
        surface: &dyn GuildSurface,
        reason: &str,
    ) -> PlatformResult<()> {
        match event {
            GuardEvent::RoleCreated { role } => surface.delete_role(role.id, reason).await,
            GuardEvent::RoleDeleted { role_id, .. } => {
                let Some(snapshot) = cache.get(*role_id).cloned() else {
                    warn!(role = %role_id, "No cached snapshot, role cannot be recreated");
                    return Ok(());
                };
                let recreated = surface.create_role(&snapshot.to_spec(), reason).await?;
                info!(old = %role_id, new = %recreated.id, "Role recreated");
                cache.replace(*role_id, recreated);
                Ok(())
            }
            GuardEvent::RoleUpdated { before, after } => {
                let Some(prior) = prior(before, after, cache).cloned() else {
                    return Err(PlatformError::api("no prior role state to restore"));
                };
                let edit = revert_edit(&prior, after);
                surface.edit_role(after.id, &edit, reason).await?;
                cache.put(prior);
                Ok(())
            }
            GuardEvent::MemberRolesUpdated { member, before, .. } => {
                let Some(before) = before else {
                    return Err(PlatformError::api("no prior role set to restore"));
                };
                surface.set_member_roles(*member, before, reason).await
            }
            GuardEvent::BotAdded { bot } => surface.kick(*bot, reason).await,
            other => Err(PlatformError::api(format!(
                "role guard cannot remediate {}",
                other.operation()
            ))),
        }
    }

    fn commit(&self, event: &GuardEvent, cache: &mut StateCache<RoleSnapshot>) {
        match event {
            GuardEvent::RoleCreated { role } => cache.put(role.clone()),
            GuardEvent::RoleDeleted { role_id, .. } => {
                cache.remove(*role_id);
            }
            GuardEvent::RoleUpdated { after, .. } => cache.put(after.clone()),
            _ => {}
        }
    }
}
