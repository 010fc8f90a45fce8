//! Read-only checks against a live test guild.
//!
//! Needs `DISCORD_TOKEN` and `WARDEN_TEST_GUILD` (in the environment or a
//! `.env` file) and the `api` feature.

use serenity::http::Http;
use std::env;
use std::sync::Arc;
use warden_discord::{GuildId, SerenityAuditTrail, SerenityGuild};
use warden_interface::{AuditOperation, AuditTrail, GuildSurface};

fn load_env() -> (String, GuildId) {
    dotenvy::dotenv().ok();
    let token = env::var("DISCORD_TOKEN").expect("DISCORD_TOKEN not set");
    let guild = env::var("WARDEN_TEST_GUILD")
        .expect("WARDEN_TEST_GUILD not set")
        .parse::<u64>()
        .expect("WARDEN_TEST_GUILD is not a snowflake");
    (token, GuildId::new(guild))
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_bot_standing_is_readable() {
    let (token, guild_id) = load_env();
    let guild = SerenityGuild::connect(Arc::new(Http::new(&token)), guild_id)
        .await
        .expect("connect failed");

    let standing = guild.own_standing().await.expect("standing failed");
    assert!(!standing.is_owner);

    let roles = guild.list_roles().await.expect("roles failed");
    assert!(roles.iter().any(|role| role.id.get() == guild_id.get()));
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_audit_log_query_respects_limit() {
    let (token, guild_id) = load_env();
    let trail = SerenityAuditTrail::new(Arc::new(Http::new(&token)), guild_id);

    let entries = trail
        .query_recent(AuditOperation::ChannelUpdate, 3)
        .await
        .expect("audit query failed");
    assert!(entries.len() <= 3);
}
