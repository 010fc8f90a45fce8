//! Hand-written collaborators for driving the engine without a live guild.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use warden_error::{PlatformError, PlatformErrorKind, PlatformResult};
use warden_guard::{ConfigHandle, GuardConfig, GuardServices, MemoryRepository};
use warden_interface::{
    AuditEntry, AuditOperation, AuditTrail, ChannelEdit, ChannelKind, ChannelSnapshot,
    ChannelSpec, GuildSurface, Notice, NotificationSink, OverwriteTarget, PermissionOverwrite,
    PunishmentType, RoleEdit, RoleSnapshot, RoleSpec, Snowflake, Standing, permission_bits,
};

/// The guard's own account.
pub const GUARD_ID: Snowflake = Snowflake(1);

#[derive(Debug, Clone)]
pub struct MockMember {
    pub roles: Vec<Snowflake>,
    pub standing: Standing,
}

#[derive(Debug, Default)]
struct GuildState {
    channels: HashMap<Snowflake, ChannelSnapshot>,
    roles: HashMap<Snowflake, RoleSnapshot>,
    members: HashMap<Snowflake, MockMember>,
    bans: HashSet<Snowflake>,
    timeouts: HashMap<Snowflake, DateTime<Utc>>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    next_id: u64,
}

/// A guild held in memory that records every remedial call.
pub struct MockGuild {
    state: Mutex<GuildState>,
    own_standing: Mutex<Standing>,
}

impl MockGuild {
    /// Empty guild; the guard is a rank-10 administrator.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GuildState {
                next_id: 1000,
                ..Default::default()
            }),
            own_standing: Mutex::new(Standing {
                rank: 10,
                permissions: permission_bits::ADMINISTRATOR,
                is_owner: false,
            }),
        }
    }

    pub fn set_own_standing(&self, standing: Standing) {
        *self.own_standing.lock() = standing;
    }

    /// Make every call to `operation` fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    pub fn add_channel(&self, channel: ChannelSnapshot) {
        self.state.lock().channels.insert(channel.id, channel);
    }

    pub fn add_role(&self, role: RoleSnapshot) {
        self.state.lock().roles.insert(role.id, role);
    }

    pub fn add_member(&self, id: Snowflake, rank: u16, roles: Vec<Snowflake>) {
        self.state.lock().members.insert(
            id,
            MockMember {
                roles,
                standing: Standing {
                    rank,
                    permissions: 0,
                    is_owner: false,
                },
            },
        );
    }

    pub fn channel(&self, id: Snowflake) -> Option<ChannelSnapshot> {
        self.state.lock().channels.get(&id).cloned()
    }

    pub fn channels(&self) -> Vec<ChannelSnapshot> {
        self.state.lock().channels.values().cloned().collect()
    }

    pub fn role(&self, id: Snowflake) -> Option<RoleSnapshot> {
        self.state.lock().roles.get(&id).cloned()
    }

    pub fn roles(&self) -> Vec<RoleSnapshot> {
        self.state.lock().roles.values().cloned().collect()
    }

    pub fn member(&self, id: Snowflake) -> Option<MockMember> {
        self.state.lock().members.get(&id).cloned()
    }

    pub fn is_banned(&self, id: Snowflake) -> bool {
        self.state.lock().bans.contains(&id)
    }

    pub fn ban_directly(&self, id: Snowflake) {
        let mut state = self.state.lock();
        state.members.remove(&id);
        state.bans.insert(id);
    }

    pub fn is_timed_out(&self, id: Snowflake) -> bool {
        self.state.lock().timeouts.contains_key(&id)
    }

    pub fn remove_channel(&self, id: Snowflake) {
        self.state.lock().channels.remove(&id);
    }

    pub fn remove_role(&self, id: Snowflake) {
        self.state.lock().roles.remove(&id);
    }

    /// Names of the remedial calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn begin(&self, operation: &'static str) -> PlatformResult<parking_lot::MutexGuard<'_, GuildState>> {
        let mut state = self.state.lock();
        state.calls.push(operation.to_string());
        if state.failing.contains(operation) {
            return Err(PlatformError::new(PlatformErrorKind::MissingPermission(
                operation.to_string(),
            )));
        }
        Ok(state)
    }
}

fn not_found(what: &str, id: Snowflake) -> PlatformError {
    PlatformError::new(PlatformErrorKind::NotFound(format!("{} {}", what, id)))
}

#[async_trait]
impl GuildSurface for MockGuild {
    fn own_id(&self) -> Snowflake {
        GUARD_ID
    }

    async fn list_channels(&self) -> PlatformResult<Vec<ChannelSnapshot>> {
        Ok(self.channels())
    }

    async fn list_roles(&self) -> PlatformResult<Vec<RoleSnapshot>> {
        Ok(self.roles())
    }

    async fn create_channel(&self, spec: &ChannelSpec, _reason: &str) -> PlatformResult<ChannelSnapshot> {
        let mut state = self.begin("create_channel")?;
        state.next_id += 1;
        let channel = ChannelSnapshot {
            id: Snowflake(state.next_id),
            name: spec.name.clone(),
            kind: spec.kind,
            parent_id: spec.parent_id,
            position: spec.position,
            overwrites: spec.overwrites.clone(),
            captured_at: Utc::now(),
        };
        state.channels.insert(channel.id, channel.clone());
        Ok(channel)
    }

    async fn edit_channel(&self, channel: Snowflake, edit: &ChannelEdit, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("edit_channel")?;
        let current = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| not_found("channel", channel))?;
        if let Some(name) = &edit.name {
            current.name = name.clone();
        }
        if let Some(overwrites) = &edit.overwrites {
            current.overwrites = overwrites.clone();
        }
        Ok(())
    }

    async fn delete_channel(&self, channel: Snowflake, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("delete_channel")?;
        state
            .channels
            .remove(&channel)
            .map(|_| ())
            .ok_or_else(|| not_found("channel", channel))
    }

    async fn add_channel_overwrite(
        &self,
        channel: Snowflake,
        overwrite: PermissionOverwrite,
        _reason: &str,
    ) -> PlatformResult<()> {
        let mut state = self.begin("add_channel_overwrite")?;
        let current = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| not_found("channel", channel))?;
        current.overwrites.retain(|o| o.target != overwrite.target);
        current.overwrites.push(overwrite);
        Ok(())
    }

    async fn create_role(&self, spec: &RoleSpec, _reason: &str) -> PlatformResult<RoleSnapshot> {
        let mut state = self.begin("create_role")?;
        state.next_id += 1;
        let role = RoleSnapshot {
            id: Snowflake(state.next_id),
            name: spec.name.clone(),
            color: spec.color,
            permissions: spec.permissions,
            position: 1,
            hoist: spec.hoist,
            mentionable: spec.mentionable,
            captured_at: Utc::now(),
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn edit_role(&self, role: Snowflake, edit: &RoleEdit, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("edit_role")?;
        let current = state.roles.get_mut(&role).ok_or_else(|| not_found("role", role))?;
        if let Some(name) = &edit.name {
            current.name = name.clone();
        }
        if let Some(color) = edit.color {
            current.color = color;
        }
        if let Some(permissions) = edit.permissions {
            current.permissions = permissions;
        }
        if let Some(hoist) = edit.hoist {
            current.hoist = hoist;
        }
        if let Some(mentionable) = edit.mentionable {
            current.mentionable = mentionable;
        }
        Ok(())
    }

    async fn delete_role(&self, role: Snowflake, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("delete_role")?;
        state
            .roles
            .remove(&role)
            .map(|_| ())
            .ok_or_else(|| not_found("role", role))
    }

    async fn member_roles(&self, member: Snowflake) -> PlatformResult<Option<Vec<Snowflake>>> {
        Ok(self.state.lock().members.get(&member).map(|m| m.roles.clone()))
    }

    async fn set_member_roles(&self, member: Snowflake, roles: &[Snowflake], _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("set_member_roles")?;
        let current = state
            .members
            .get_mut(&member)
            .ok_or_else(|| not_found("member", member))?;
        current.roles = roles.to_vec();
        Ok(())
    }

    async fn remove_member_role(&self, member: Snowflake, role: Snowflake, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("remove_member_role")?;
        let current = state
            .members
            .get_mut(&member)
            .ok_or_else(|| not_found("member", member))?;
        current.roles.retain(|r| *r != role);
        Ok(())
    }

    async fn kick(&self, member: Snowflake, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("kick")?;
        state
            .members
            .remove(&member)
            .map(|_| ())
            .ok_or_else(|| not_found("member", member))
    }

    async fn ban(&self, user: Snowflake, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("ban")?;
        state.members.remove(&user);
        state.bans.insert(user);
        Ok(())
    }

    async fn unban(&self, user: Snowflake, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("unban")?;
        if state.bans.remove(&user) {
            Ok(())
        } else {
            Err(not_found("ban", user))
        }
    }

    async fn timeout(&self, member: Snowflake, until: DateTime<Utc>, _reason: &str) -> PlatformResult<()> {
        let mut state = self.begin("timeout")?;
        state.timeouts.insert(member, until);
        Ok(())
    }

    async fn own_standing(&self) -> PlatformResult<Standing> {
        Ok(*self.own_standing.lock())
    }

    async fn member_standing(&self, member: Snowflake) -> PlatformResult<Option<Standing>> {
        Ok(self.state.lock().members.get(&member).map(|m| m.standing))
    }
}

/// Audit trail that returns whatever the test pushed, newest first.
#[derive(Default)]
pub struct ScriptedTrail {
    entries: Mutex<HashMap<AuditOperation, Vec<AuditEntry>>>,
    queries: Mutex<Vec<AuditOperation>>,
}

impl ScriptedTrail {
    /// Record that `executor` performed `operation` on `target`.
    pub fn push(&self, operation: AuditOperation, executor: Snowflake, target: Option<Snowflake>) {
        self.entries
            .lock()
            .entry(operation)
            .or_default()
            .insert(
                0,
                AuditEntry {
                    executor_id: executor,
                    target_id: target,
                    reason: None,
                    timestamp: Utc::now(),
                },
            );
    }

    pub fn queries(&self) -> Vec<AuditOperation> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl AuditTrail for ScriptedTrail {
    async fn query_recent(&self, operation: AuditOperation, limit: u8) -> PlatformResult<Vec<AuditEntry>> {
        self.queries.lock().push(operation);
        Ok(self
            .entries
            .lock()
            .get(&operation)
            .map(|entries| entries.iter().take(usize::from(limit)).cloned().collect())
            .unwrap_or_default())
    }
}

/// Sink that keeps every notice it is given.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, Notice)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<(String, Notice)> {
        self.sent.lock().clone()
    }

    /// Make every send fail, as a deleted or unwritable log channel does.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, channel_name: &str, notice: &Notice) -> PlatformResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlatformError::new(PlatformErrorKind::NotFound(format!(
                "log channel {}",
                channel_name
            ))));
        }
        self.sent.lock().push((channel_name.to_string(), notice.clone()));
        Ok(())
    }
}

/// Every collaborator a test needs, wired together.
pub struct Harness {
    pub guild: Arc<MockGuild>,
    pub trail: Arc<ScriptedTrail>,
    pub repository: Arc<MemoryRepository>,
    pub sink: Arc<RecordingSink>,
    pub config: ConfigHandle,
    pub services: GuardServices,
}

impl Harness {
    /// Harness with no settling delay and the given punishment type.
    pub fn new(kind: PunishmentType) -> Self {
        let toml = format!(
            r#"
guild_id = 500
system_accounts = [2]

[punishment]
type = "{}"

[correlation]
settle_delay_ms = 0
"#,
            kind
        );
        let config = ConfigHandle::new(
            GuardConfig::from_toml(&toml).expect("test config parses"),
            None,
        );
        let guild = Arc::new(MockGuild::new());
        let trail = Arc::new(ScriptedTrail::default());
        let repository = Arc::new(MemoryRepository::new());
        let sink = Arc::new(RecordingSink::default());
        let services = GuardServices {
            surface: guild.clone(),
            trail: trail.clone(),
            repository: repository.clone(),
            sink: Some(sink.clone()),
            config: config.clone(),
        };
        Self {
            guild,
            trail,
            repository,
            sink,
            config,
            services,
        }
    }

    /// Audit-event action codes stored so far, oldest first.
    pub fn actions(&self) -> Vec<String> {
        self.repository
            .audit_events()
            .iter()
            .map(|e| e.action().clone())
            .collect()
    }
}

pub fn text_channel(id: u64, name: &str, overwrites: Vec<PermissionOverwrite>) -> ChannelSnapshot {
    ChannelSnapshot {
        id: Snowflake(id),
        name: name.to_string(),
        kind: ChannelKind::Text,
        parent_id: Some(Snowflake(90)),
        position: 2,
        overwrites,
        captured_at: Utc::now(),
    }
}

pub fn role_overwrite(role: u64, allow: u64, deny: u64) -> PermissionOverwrite {
    PermissionOverwrite {
        target: OverwriteTarget::Role(Snowflake(role)),
        allow,
        deny,
    }
}

pub fn role(id: u64, name: &str, permissions: u64) -> RoleSnapshot {
    RoleSnapshot {
        id: Snowflake(id),
        name: name.to_string(),
        color: 0x3498db,
        permissions,
        position: 4,
        hoist: false,
        mentionable: false,
        captured_at: Utc::now(),
    }
}
