mod common;

use common::{GUARD_ID, Harness, role, role_overwrite, text_channel};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use warden_guard::{
    BanPolicy, ChannelPolicy, ConfigHandle, GuardConfig, GuardEngine, GuardServices, IgnoreReason,
    Outcome, RolePolicy,
};
use warden_interface::{
    AllowListEntry, AuditOperation, GuardEvent, GuardRepository, PunishmentType, Snowflake,
    Standing, permission_bits,
};

const INTRUDER: Snowflake = Snowflake(301);
const TRUSTED: Snowflake = Snowflake(302);

async fn allow(harness: &Harness, subject: Snowflake) {
    harness
        .repository
        .insert_allow_entry(&AllowListEntry::new(subject, None))
        .await
        .unwrap();
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test]
async fn test_unauthorized_admin_role_is_deleted_and_creator_banned() {
    let harness = Harness::new(PunishmentType::Ban);
    harness.guild.add_member(INTRUDER, 2, Vec::new());
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);
    engine.prime().await.unwrap();

    let admin = role(700, "Admin", permission_bits::ADMINISTRATOR);
    harness.guild.add_role(admin.clone());
    harness
        .trail
        .push(AuditOperation::RoleCreate, INTRUDER, Some(admin.id));

    let outcome = engine.handle(&GuardEvent::RoleCreated { role: admin.clone() }).await;

    assert_eq!(outcome, Outcome::Reverted);
    assert!(harness.guild.role(admin.id).is_none());
    assert!(harness.guild.is_banned(INTRUDER));
    assert_eq!(harness.actions(), vec!["ROLE_CREATE_BLOCKED"]);

    let events = harness.repository.audit_events();
    assert!(*events[0].was_blocked());
    assert_eq!(*events[0].executor_id(), Some(INTRUDER));

    let punishments = harness.repository.punishments();
    assert_eq!(punishments.len(), 1);
    assert_eq!(*punishments[0].punishment_type(), PunishmentType::Ban);
    assert_eq!(punishments[0].action(), "ROLE_CREATE_BLOCKED");
}

#[tokio::test]
async fn test_authorized_channel_deletion_is_accepted() {
    let harness = Harness::new(PunishmentType::Quarantine);
    allow(&harness, TRUSTED).await;
    let general = text_channel(40, "general", vec![role_overwrite(7, 0, permission_bits::SEND_MESSAGES)]);
    harness.guild.add_channel(general.clone());
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);
    engine.prime().await.unwrap();

    harness.guild.remove_channel(general.id);
    harness
        .trail
        .push(AuditOperation::ChannelDelete, TRUSTED, Some(general.id));
    let outcome = engine.handle(&GuardEvent::ChannelDeleted { channel: general.clone() }).await;

    assert_eq!(outcome, Outcome::Authorized);
    assert!(!engine.cache().contains(general.id));
    assert!(harness.guild.calls().is_empty());
    assert_eq!(harness.actions(), vec!["CHANNEL_DELETE_AUTHORIZED"]);
    assert!(harness.repository.punishments().is_empty());

    let entry = harness
        .repository
        .find_allow_entry(TRUSTED)
        .await
        .unwrap()
        .unwrap();
    assert!(entry.last_seen_at.is_some());
}

#[tokio::test]
async fn test_unauthorized_channel_deletion_is_recreated_from_cache() {
    let harness = Harness::new(PunishmentType::Warn);
    let overwrites = vec![
        role_overwrite(7, 0, permission_bits::SEND_MESSAGES),
        role_overwrite(8, permission_bits::VIEW_CHANNEL, 0),
    ];
    let general = text_channel(40, "general", overwrites.clone());
    harness.guild.add_channel(general.clone());
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);
    engine.prime().await.unwrap();

    harness.guild.remove_channel(general.id);
    harness
        .trail
        .push(AuditOperation::ChannelDelete, INTRUDER, Some(general.id));
    let outcome = engine.handle(&GuardEvent::ChannelDeleted { channel: general.clone() }).await;

    assert_eq!(outcome, Outcome::Reverted);
    let recreated = harness.guild.channels();
    assert_eq!(recreated.len(), 1);
    assert_eq!(recreated[0].name, "general");
    assert_eq!(recreated[0].parent_id, general.parent_id);
    assert_eq!(recreated[0].sorted_overwrites(), general.sorted_overwrites());
    assert_ne!(recreated[0].id, general.id);

    // The recreated channel is protected under its new id.
    assert!(!engine.cache().contains(general.id));
    assert!(engine.cache().contains(recreated[0].id));
    assert_eq!(harness.actions(), vec!["CHANNEL_DELETE_BLOCKED"]);
}

#[tokio::test]
async fn test_missing_correlation_drops_ban_event() {
    let harness = Harness::new(PunishmentType::Ban);
    harness.guild.ban_directly(Snowflake(77));
    let mut engine = GuardEngine::new(BanPolicy, &harness.services);

    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let outcome = engine
        .handle(&GuardEvent::BanAdded { user: Snowflake(77) })
        .await;

    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::MissingCorrelation));
    assert!(harness.guild.is_banned(Snowflake(77)));
    assert!(harness.guild.calls().is_empty());
    assert!(harness.repository.audit_events().is_empty());
    assert!(harness.repository.punishments().is_empty());
    assert_eq!(warnings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_self_caused_event_changes_nothing() {
    let harness = Harness::new(PunishmentType::Kick);
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);
    engine.prime().await.unwrap();

    let channel = text_channel(41, "restored", Vec::new());
    harness.guild.add_channel(channel.clone());
    harness
        .trail
        .push(AuditOperation::ChannelCreate, GUARD_ID, Some(channel.id));
    let outcome = engine.handle(&GuardEvent::ChannelCreated { channel: channel.clone() }).await;

    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::SelfAction));
    assert!(engine.cache().is_empty());
    assert!(harness.guild.channel(channel.id).is_some());
    assert!(harness.repository.audit_events().is_empty());
}

#[tokio::test]
async fn test_system_account_is_authorized_without_entry() {
    let harness = Harness::new(PunishmentType::Kick);
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);

    let channel = text_channel(42, "bot-made", Vec::new());
    harness
        .trail
        .push(AuditOperation::ChannelCreate, Snowflake(2), Some(channel.id));
    let outcome = engine.handle(&GuardEvent::ChannelCreated { channel: channel.clone() }).await;

    assert_eq!(outcome, Outcome::Authorized);
    assert!(engine.cache().contains(channel.id));
}

#[tokio::test]
async fn test_replaying_reverted_creation_does_not_crash() {
    let harness = Harness::new(PunishmentType::Warn);
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);

    let channel = text_channel(43, "spam", Vec::new());
    harness.guild.add_channel(channel.clone());
    harness
        .trail
        .push(AuditOperation::ChannelCreate, INTRUDER, Some(channel.id));
    let event = GuardEvent::ChannelCreated { channel: channel.clone() };

    assert_eq!(engine.handle(&event).await, Outcome::Reverted);
    let replay = engine.handle(&event).await;

    assert!(matches!(replay, Outcome::Reverted | Outcome::RevertFailed));
    assert!(harness.guild.channel(channel.id).is_none());
    assert!(harness.guild.channels().is_empty());
}

#[tokio::test]
async fn test_unauthorized_channel_edit_is_reverted() {
    let harness = Harness::new(PunishmentType::Warn);
    let before = text_channel(44, "rules", vec![role_overwrite(7, 0, permission_bits::SEND_MESSAGES)]);
    let mut after = before.clone();
    after.name = "pwned".to_string();
    after.overwrites.clear();
    harness.guild.add_channel(after.clone());

    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);
    harness
        .trail
        .push(AuditOperation::ChannelUpdate, INTRUDER, Some(after.id));
    let outcome = engine
        .handle(&GuardEvent::ChannelUpdated {
            before: Some(before.clone()),
            after,
        })
        .await;

    assert_eq!(outcome, Outcome::Reverted);
    let restored = harness.guild.channel(before.id).unwrap();
    assert_eq!(restored.name, "rules");
    assert_eq!(restored.sorted_overwrites(), before.sorted_overwrites());
    assert_eq!(engine.cache().get(before.id).map(|c| c.name.as_str()), Some("rules"));
    assert_eq!(harness.actions(), vec!["CHANNEL_UPDATE_BLOCKED"]);
    assert_eq!(harness.repository.punishments().len(), 1);
}

#[tokio::test]
async fn test_overwrite_only_edit_is_matched_to_overwrite_entry() {
    let harness = Harness::new(PunishmentType::Warn);
    allow(&harness, TRUSTED).await;
    let before = text_channel(
        44,
        "staff",
        vec![
            role_overwrite(500, 0, permission_bits::VIEW_CHANNEL),
            role_overwrite(7, permission_bits::VIEW_CHANNEL, 0),
        ],
    );
    let mut after = before.clone();
    after.overwrites.clear();
    harness.guild.add_channel(after.clone());

    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);
    // An older rename by a trusted account is still the newest CHANNEL_UPDATE.
    harness
        .trail
        .push(AuditOperation::ChannelUpdate, TRUSTED, Some(before.id));
    harness
        .trail
        .push(AuditOperation::ChannelOverwriteDelete, INTRUDER, Some(before.id));
    let outcome = engine
        .handle(&GuardEvent::ChannelUpdated {
            before: Some(before.clone()),
            after,
        })
        .await;

    assert_eq!(outcome, Outcome::Reverted);
    assert_eq!(
        harness.trail.queries(),
        vec![AuditOperation::ChannelOverwriteDelete]
    );
    let restored = harness.guild.channel(before.id).unwrap();
    assert_eq!(restored.sorted_overwrites(), before.sorted_overwrites());
    assert_eq!(
        engine.cache().get(before.id).map(|c| c.sorted_overwrites()),
        Some(before.sorted_overwrites())
    );
    let events = harness.repository.audit_events();
    assert_eq!(*events[0].executor_id(), Some(INTRUDER));
    assert_eq!(harness.repository.punishments().len(), 1);
}

#[tokio::test]
async fn test_newest_entry_wins_across_edit_kinds() {
    let harness = Harness::new(PunishmentType::Warn);
    allow(&harness, TRUSTED).await;
    let before = text_channel(49, "news", vec![role_overwrite(7, 0, permission_bits::SEND_MESSAGES)]);
    let mut after = before.clone();
    after.name = "news-archive".to_string();
    after.overwrites.clear();
    harness.guild.add_channel(after.clone());

    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);
    harness
        .trail
        .push(AuditOperation::ChannelOverwriteDelete, INTRUDER, Some(before.id));
    harness
        .trail
        .push(AuditOperation::ChannelUpdate, TRUSTED, Some(before.id));
    let outcome = engine
        .handle(&GuardEvent::ChannelUpdated {
            before: Some(before.clone()),
            after: after.clone(),
        })
        .await;

    assert_eq!(outcome, Outcome::Authorized);
    assert_eq!(
        harness.trail.queries(),
        vec![AuditOperation::ChannelUpdate, AuditOperation::ChannelOverwriteDelete]
    );
    assert_eq!(engine.cache().get(before.id), Some(&after));
}

#[tokio::test]
async fn test_update_for_other_entity_is_mismatched() {
    let harness = Harness::new(PunishmentType::Kick);
    let before = text_channel(45, "a", Vec::new());
    let mut after = before.clone();
    after.name = "b".to_string();

    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);
    harness
        .trail
        .push(AuditOperation::ChannelUpdate, INTRUDER, Some(Snowflake(999)));
    let outcome = engine
        .handle(&GuardEvent::ChannelUpdated {
            before: Some(before),
            after,
        })
        .await;

    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::MismatchedCorrelation));
    assert!(harness.repository.audit_events().is_empty());
}

#[tokio::test]
async fn test_unchanged_update_skips_audit_query() {
    let harness = Harness::new(PunishmentType::Kick);
    let channel = text_channel(46, "same", Vec::new());
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);

    let outcome = engine
        .handle(&GuardEvent::ChannelUpdated {
            before: Some(channel.clone()),
            after: channel,
        })
        .await;

    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NoChange));
    assert!(harness.trail.queries().is_empty());
}

#[tokio::test]
async fn test_authorized_role_edit_updates_cache() {
    let harness = Harness::new(PunishmentType::Kick);
    allow(&harness, TRUSTED).await;
    let mods = role(60, "Mods", permission_bits::KICK_MEMBERS);
    harness.guild.add_role(mods.clone());
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);
    engine.prime().await.unwrap();

    let mut edited = mods.clone();
    edited.permissions |= permission_bits::BAN_MEMBERS;
    harness
        .trail
        .push(AuditOperation::RoleUpdate, TRUSTED, Some(mods.id));
    let outcome = engine
        .handle(&GuardEvent::RoleUpdated {
            before: None,
            after: edited.clone(),
        })
        .await;

    assert_eq!(outcome, Outcome::Authorized);
    assert_eq!(engine.cache().get(mods.id), Some(&edited));
    assert_eq!(harness.actions(), vec!["ROLE_UPDATE_AUTHORIZED"]);
}

#[tokio::test]
async fn test_unauthorized_role_grant_is_rolled_back() {
    let harness = Harness::new(PunishmentType::Warn);
    let member = Snowflake(410);
    harness.guild.add_member(member, 1, vec![Snowflake(5), Snowflake(60)]);
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);

    harness
        .trail
        .push(AuditOperation::MemberRoleUpdate, INTRUDER, Some(member));
    let outcome = engine
        .handle(&GuardEvent::MemberRolesUpdated {
            member,
            before: Some(vec![Snowflake(5)]),
            after: vec![Snowflake(5), Snowflake(60)],
        })
        .await;

    assert_eq!(outcome, Outcome::Reverted);
    assert_eq!(harness.guild.member(member).unwrap().roles, vec![Snowflake(5)]);
    assert_eq!(harness.actions(), vec!["MEMBER_ROLE_UPDATE_BLOCKED"]);
}

#[tokio::test]
async fn test_unauthorized_bot_is_kicked() {
    let harness = Harness::new(PunishmentType::Warn);
    let bot = Snowflake(520);
    harness.guild.add_member(bot, 0, Vec::new());
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);

    harness.trail.push(AuditOperation::BotAdd, INTRUDER, Some(bot));
    let outcome = engine.handle(&GuardEvent::BotAdded { bot }).await;

    assert_eq!(outcome, Outcome::Reverted);
    assert!(harness.guild.member(bot).is_none());
    assert_eq!(harness.actions(), vec!["BOT_ADD_BLOCKED"]);
    let sent = harness.sink.sent();
    assert_eq!(sent[0].0, "security-logs");
}

#[tokio::test]
async fn test_unauthorized_unban_is_observed_only() {
    let harness = Harness::new(PunishmentType::Kick);
    let mut engine = GuardEngine::new(BanPolicy, &harness.services);

    harness
        .trail
        .push(AuditOperation::MemberBanRemove, INTRUDER, Some(Snowflake(88)));
    let outcome = engine
        .handle(&GuardEvent::BanRemoved { user: Snowflake(88) })
        .await;

    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::ObservedOnly));
    assert!(harness.guild.calls().is_empty());
    assert!(harness.repository.audit_events().is_empty());
}

#[tokio::test]
async fn test_unauthorized_ban_is_lifted() {
    let harness = Harness::new(PunishmentType::Warn);
    harness.guild.ban_directly(Snowflake(89));
    let mut engine = GuardEngine::new(BanPolicy, &harness.services);

    harness
        .trail
        .push(AuditOperation::MemberBanAdd, INTRUDER, Some(Snowflake(89)));
    let outcome = engine
        .handle(&GuardEvent::BanAdded { user: Snowflake(89) })
        .await;

    assert_eq!(outcome, Outcome::Reverted);
    assert!(!harness.guild.is_banned(Snowflake(89)));
    assert_eq!(harness.actions(), vec!["BAN_ATTEMPT_BLOCKED"]);
    let sent = harness.sink.sent();
    assert_eq!(sent[0].0, "guard-logs");
    assert_eq!(sent[0].1.title, "Ban Attempt Blocked");
}

#[tokio::test]
async fn test_hierarchy_violation_leaves_executor_untouched() {
    let harness = Harness::new(PunishmentType::Kick);
    harness.guild.add_member(INTRUDER, 10, vec![Snowflake(5)]);
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);

    let rogue = role(701, "rogue", 0);
    harness.guild.add_role(rogue.clone());
    harness
        .trail
        .push(AuditOperation::RoleCreate, INTRUDER, Some(rogue.id));
    let outcome = engine.handle(&GuardEvent::RoleCreated { role: rogue.clone() }).await;

    assert_eq!(outcome, Outcome::Reverted);
    assert!(harness.guild.role(rogue.id).is_none());
    assert!(harness.guild.member(INTRUDER).is_some());
    assert!(harness.repository.punishments().is_empty());
    assert_eq!(harness.actions(), vec!["PUNISHMENT_FAILED", "ROLE_CREATE_BLOCKED"]);
}

#[tokio::test]
async fn test_missing_capability_aborts_punishment() {
    let harness = Harness::new(PunishmentType::Ban);
    harness.guild.set_own_standing(Standing {
        rank: 10,
        permissions: permission_bits::MANAGE_ROLES,
        is_owner: false,
    });
    harness.guild.add_member(INTRUDER, 1, Vec::new());
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);

    let rogue = role(702, "rogue", 0);
    harness.guild.add_role(rogue.clone());
    harness
        .trail
        .push(AuditOperation::RoleCreate, INTRUDER, Some(rogue.id));
    engine.handle(&GuardEvent::RoleCreated { role: rogue }).await;

    assert!(!harness.guild.is_banned(INTRUDER));
    assert!(harness.repository.punishments().is_empty());
    let failure = &harness.repository.audit_events()[0];
    assert_eq!(failure.action(), "PUNISHMENT_FAILED");
    assert!(failure.summary().unwrap().contains("ban"));
}

#[tokio::test]
async fn test_revert_failure_still_punishes() {
    let harness = Harness::new(PunishmentType::Quarantine);
    harness.guild.add_channel(text_channel(47, "lobby", Vec::new()));
    harness.guild.add_member(INTRUDER, 1, vec![Snowflake(5), Snowflake(6)]);
    harness.guild.fail_on("delete_role");
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);

    let rogue = role(703, "rogue", permission_bits::ADMINISTRATOR);
    harness.guild.add_role(rogue.clone());
    harness
        .trail
        .push(AuditOperation::RoleCreate, INTRUDER, Some(rogue.id));
    let outcome = engine.handle(&GuardEvent::RoleCreated { role: rogue.clone() }).await;

    assert_eq!(outcome, Outcome::RevertFailed);
    assert!(harness.guild.role(rogue.id).is_some());

    let quarantine = harness
        .guild
        .roles()
        .into_iter()
        .find(|r| r.name == "Quarantine")
        .unwrap();
    assert_eq!(harness.guild.member(INTRUDER).unwrap().roles, vec![quarantine.id]);
    let lobby = harness.guild.channel(Snowflake(47)).unwrap();
    assert!(lobby.overwrites.iter().any(|o| o.deny == permission_bits::QUARANTINE_DENY));

    let events = harness.repository.audit_events();
    assert_eq!(events.len(), 1);
    assert!(*events[0].was_blocked());
    assert_eq!(events[0].details()["reverted"], false);
    assert_eq!(harness.repository.punishments().len(), 1);
}

#[tokio::test]
async fn test_store_outage_is_best_effort() {
    let harness = Harness::new(PunishmentType::Warn);
    allow(&harness, TRUSTED).await;
    let before = text_channel(48, "announcements", Vec::new());
    let mut after = before.clone();
    after.name = "renamed".to_string();
    harness.guild.add_channel(after.clone());
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);

    harness.repository.set_available(false);
    harness
        .trail
        .push(AuditOperation::ChannelUpdate, TRUSTED, Some(after.id));
    let outcome = engine
        .handle(&GuardEvent::ChannelUpdated {
            before: Some(before.clone()),
            after,
        })
        .await;

    // The allow-list cannot be read, so the edit is treated as unauthorized.
    assert_eq!(outcome, Outcome::Reverted);
    assert_eq!(harness.guild.channel(before.id).unwrap().name, "announcements");
    assert_eq!(harness.sink.sent().len(), 1);

    harness.repository.set_available(true);
    assert!(harness.repository.audit_events().is_empty());
}

#[tokio::test]
async fn test_notification_failure_still_records_block() {
    let harness = Harness::new(PunishmentType::Warn);
    let before = text_channel(51, "welcome", Vec::new());
    let mut after = before.clone();
    after.name = "spam".to_string();
    harness.guild.add_channel(after.clone());
    let mut engine = GuardEngine::new(ChannelPolicy, &harness.services);

    harness.sink.set_failing(true);
    harness
        .trail
        .push(AuditOperation::ChannelUpdate, INTRUDER, Some(after.id));
    let outcome = engine
        .handle(&GuardEvent::ChannelUpdated {
            before: Some(before.clone()),
            after,
        })
        .await;

    assert_eq!(outcome, Outcome::Reverted);
    assert_eq!(harness.guild.channel(before.id).unwrap().name, "welcome");
    assert!(harness.sink.sent().is_empty());
    let events = harness.repository.audit_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action(), "CHANNEL_UPDATE_BLOCKED");
    assert!(*events[0].was_blocked());
    assert_eq!(harness.repository.punishments().len(), 1);
}

#[tokio::test]
async fn test_unauthorized_role_deletion_is_recreated_from_cache() {
    let harness = Harness::new(PunishmentType::Warn);
    let mut staff = role(61, "Staff", permission_bits::KICK_MEMBERS | permission_bits::BAN_MEMBERS);
    staff.color = 0xe67e22;
    staff.hoist = true;
    staff.mentionable = true;
    harness.guild.add_role(staff.clone());
    let mut engine = GuardEngine::new(RolePolicy, &harness.services);
    engine.prime().await.unwrap();

    harness.guild.remove_role(staff.id);
    harness
        .trail
        .push(AuditOperation::RoleDelete, INTRUDER, Some(staff.id));
    let outcome = engine
        .handle(&GuardEvent::RoleDeleted {
            role_id: staff.id,
            role: None,
        })
        .await;

    assert_eq!(outcome, Outcome::Reverted);
    let roles = harness.guild.roles();
    assert_eq!(roles.len(), 1);
    let recreated = &roles[0];
    assert_ne!(recreated.id, staff.id);
    assert_eq!(recreated.name, "Staff");
    assert_eq!(recreated.color, staff.color);
    assert_eq!(recreated.permissions, staff.permissions);
    assert!(recreated.hoist);
    assert!(recreated.mentionable);

    assert!(!engine.cache().contains(staff.id));
    assert!(engine.cache().contains(recreated.id));
    assert_eq!(harness.actions(), vec!["ROLE_DELETE_BLOCKED"]);
    assert_eq!(harness.repository.punishments().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settling_delay_precedes_audit_query() {
    let harness = Harness::new(PunishmentType::Warn);
    let config = GuardConfig::from_toml("guild_id = 500\n[correlation]\nsettle_delay_ms = 1000\n")
        .unwrap();
    let services = GuardServices {
        config: ConfigHandle::new(config, None),
        ..harness.services.clone()
    };
    let mut engine = GuardEngine::new(BanPolicy, &services);

    harness
        .trail
        .push(AuditOperation::MemberBanAdd, TRUSTED, Some(Snowflake(90)));
    allow(&harness, TRUSTED).await;

    let start = tokio::time::Instant::now();
    let outcome = engine
        .handle(&GuardEvent::BanAdded { user: Snowflake(90) })
        .await;

    assert_eq!(outcome, Outcome::Authorized);
    assert!(start.elapsed() >= std::time::Duration::from_millis(1000));
    assert_eq!(harness.trail.queries(), vec![AuditOperation::MemberBanAdd]);
}
