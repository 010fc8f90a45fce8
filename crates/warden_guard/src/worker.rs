//! Event loop for one guard process.

use crate::{ConfigHandle, GuardEngine, GuardPolicy, Outcome};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, instrument};
use warden_interface::GuardEvent;

/// Message types for a guard worker.
#[derive(Debug)]
pub enum GuardMessage {
    /// Process a gateway event
    Event(GuardEvent),
    /// Stop after the current event
    Shutdown,
}

/// Drains gateway events into a [`GuardEngine`], one at a time.
pub struct GuardWorker<P: GuardPolicy> {
    engine: GuardEngine<P>,
    rx: mpsc::Receiver<GuardMessage>,
}

impl<P: GuardPolicy> GuardWorker<P> {
    /// Creates a worker reading from `rx`.
    pub fn new(engine: GuardEngine<P>, rx: mpsc::Receiver<GuardMessage>) -> Self {
        Self { engine, rx }
    }

    /// Prime the cache, then handle events until shutdown or until every
    /// sender is dropped.
    ///
    /// A failed prime is logged and the worker runs with an empty cache;
    /// deletions of uncached entities are then punished but not restored.
    #[instrument(skip(self), fields(guard = %self.engine.policy().source()))]
    pub async fn run(mut self) -> GuardEngine<P> {
        if let Err(e) = self.engine.prime().await {
            error!(error = %e, "Failed to prime state cache");
        }
        info!("Guard worker started");

        while let Some(message) = self.rx.recv().await {
            match message {
                GuardMessage::Event(event) => {
                    let outcome = self.engine.handle(&event).await;
                    match outcome {
                        Outcome::Ignored(_) => debug!(outcome = %outcome, "Event processed"),
                        _ => info!(outcome = %outcome, "Event processed"),
                    }
                }
                GuardMessage::Shutdown => {
                    info!("Guard worker shutting down");
                    break;
                }
            }
        }
        self.engine
    }
}

/// Re-read the config file every `reload_interval_secs` until the returned
/// handle is aborted.
pub fn spawn_config_reload(config: ConfigHandle) -> JoinHandle<()> {
    let period = config.read(|c| c.correlation().reload_interval());
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match config.reload() {
                Ok(true) => info!("Configuration reloaded"),
                Ok(false) => debug!("Configuration unchanged"),
                Err(e) => error!(error = %e, "Configuration reload failed"),
            }
        }
    })
}
