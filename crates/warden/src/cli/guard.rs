//! `warden guard <kind>`: one guard process.

use super::{Cli, Connection, GuardKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};
use warden_discord::WardenBot;
use warden_error::WardenResult;
use warden_guard::{
    BanPolicy, ChannelPolicy, GuardEngine, GuardMessage, GuardPolicy, GuardServices, GuardWorker,
    RolePolicy, spawn_config_reload,
};
use warden_interface::GuardSource;

/// Gateway events buffered ahead of the worker.
const EVENT_BUFFER: usize = 256;

fn spawn_worker<P: GuardPolicy>(
    policy: P,
    services: &GuardServices,
    rx: mpsc::Receiver<GuardMessage>,
) -> JoinHandle<()> {
    let worker = GuardWorker::new(GuardEngine::new(policy, services), rx);
    tokio::spawn(async move {
        let engine = worker.run().await;
        info!(cached = engine.cache().len(), "Guard worker stopped");
    })
}

/// Connect to the gateway and run the guard `kind` until Ctrl+C or a fatal
/// gateway error.
///
/// # Errors
///
/// Fails if setup fails or the gateway connection ends with an error.
#[instrument(skip(cli), fields(guard = ?kind))]
pub async fn run_guard(cli: &Cli, kind: GuardKind) -> WardenResult<()> {
    let connection = Connection::open(cli).await?;
    let source = GuardSource::from(kind);

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let mut bot = WardenBot::new(&connection.token, connection.guild_id, source, tx.clone()).await?;
    let services = connection.services(bot.http()).await?;

    let worker = match kind {
        GuardKind::Ban => spawn_worker(BanPolicy, &services, rx),
        GuardKind::Channel => spawn_worker(ChannelPolicy, &services, rx),
        GuardKind::Role => spawn_worker(RolePolicy, &services, rx),
    };
    let reload = spawn_config_reload(services.config.clone());
    let shards = bot.shard_manager();
    info!(guard = %source, guild_id = %connection.guild_id, "Guard starting");

    let result = tokio::select! {
        result = bot.start() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received");
            shards.shutdown_all().await;
            Ok(())
        }
    };

    reload.abort();
    if tx.send(GuardMessage::Shutdown).await.is_err() {
        error!("Guard worker exited early");
    }
    if let Err(e) = worker.await {
        error!(error = %e, "Guard worker task failed");
    }
    result?;
    Ok(())
}
