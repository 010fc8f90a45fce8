use super::{EventProfile, GuardPolicy, IgnoreReason, Screening};
use crate::StateCache;
use async_trait::async_trait;
use warden_error::{PlatformError, PlatformResult};
use warden_interface::{GuardEvent, GuardSource, GuildSurface, LogCategory, Snapshot, Snowflake};

/// A ban the guard has seen authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannedUser {
    /// Banned user
    pub user: Snowflake,
}

impl Snapshot for BannedUser {
    fn id(&self) -> Snowflake {
        self.user
    }

    fn display_name(&self) -> &str {
        "banned user"
    }
}

/// Ban protection: unauthorized bans are lifted.
///
/// Unauthorized unbans are only observed. The cache tracks bans that were
/// authorized while the guard was running and starts empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct BanPolicy;

#[async_trait]
impl GuardPolicy for BanPolicy {
    type Snapshot = BannedUser;

    fn source(&self) -> GuardSource {
        GuardSource::Ban
    }

    async fn enumerate(&self, _surface: &dyn GuildSurface) -> PlatformResult<Vec<BannedUser>> {
        Ok(Vec::new())
    }

    fn screen(&self, event: &GuardEvent, _cache: &StateCache<BannedUser>) -> Screening {
        match event {
            GuardEvent::BanAdded { user } => Screening::Proceed(EventProfile {
                category: LogCategory::Ban,
                authorized_action: "BAN_AUTHORIZED",
                blocked_action: Some("BAN_ATTEMPT_BLOCKED"),
                target_label: user.mention(),
                summary: format!("{} was banned", user.mention()),
                remedy: "Ban lifted",
            }),
            GuardEvent::BanRemoved { user } => Screening::Proceed(EventProfile {
                category: LogCategory::Ban,
                authorized_action: "UNBAN_AUTHORIZED",
                blocked_action: None,
                target_label: user.mention(),
                summary: format!("{} was unbanned", user.mention()),
                remedy: "None",
            }),
            _ => Screening::Ignore(IgnoreReason::OutOfScope),
        }
    }

    async fn remediate(
        &self,
        event: &GuardEvent,
        _cache: &mut StateCache<BannedUser>,
        surface: &dyn GuildSurface,
        reason: &str,
    ) -> PlatformResult<()> {
        match event {
            GuardEvent::BanAdded { user } => surface.unban(*user, reason).await,
            other => Err(PlatformError::api(format!(
                "ban guard cannot remediate {}",
                other.operation()
            ))),
        }
    }

    fn commit(&self, event: &GuardEvent, cache: &mut StateCache<BannedUser>) {
        match event {
            GuardEvent::BanAdded { user } => cache.put(BannedUser { user: *user }),
            GuardEvent::BanRemoved { user } => {
                cache.remove(*user);
            }
            _ => {}
        }
    }
}
