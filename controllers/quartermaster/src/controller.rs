//! Main controller implementation.
//!
//! Startup emits one full cluster snapshot, then starts a watcher per
//! configured kind. While running, watchers that exited on their own are
//! dropped from the live set and the configuration file (if any) is polled;
//! a change stops the stale watchers and starts the new ones. Shutdown stops
//! every watcher and waits for the tasks to exit.

use crate::config::Config;
use crate::context::Context;
use crate::error::ControllerError;
use crate::lifecycle::{active_kinds, prune_finished, start_watchers, stop_all, stop_watchers, StopSignals};
use crate::probes::ProbeState;
use crate::snapshot::initialize;
use cluster_client::KubeResourceClient;
use collector_client::HttpEmitter;
use inventory::UidGenerator;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Inventory controller
#[derive(Debug)]
pub struct Controller {
    ctx: Context,
    config: Arc<Config>,
    probes: ProbeState,
}

impl Controller {
    pub fn new(ctx: Context, config: Config, probes: ProbeState) -> Self {
        Self {
            ctx,
            config: Arc::new(config),
            probes,
        }
    }

    /// Creates a controller talking to the ambient cluster and the HTTP collector.
    pub async fn connect(config: Config, probes: ProbeState) -> Result<Self, ControllerError> {
        info!("Initializing Quartermaster Controller");

        let client = KubeResourceClient::try_default().await?;
        let emitter = HttpEmitter::new(config.emit_timeout)?;
        let ctx = Context::new(Arc::new(client), Arc::new(emitter), Arc::new(UidGenerator::new()));

        Ok(Self::new(ctx, config, probes))
    }

    /// Run until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let mut config = Arc::clone(&self.config);

        info!("Taking initial cluster snapshot");
        initialize(&self.ctx, &config).await;

        let mut signals = start_watchers(&self.ctx, &config);
        self.publish(&signals);
        self.probes.set_ready(true);
        info!("Controller running, watching {:?}", active_kinds(&signals));

        let mut ticker = tokio::time::interval(config.config_poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    prune_finished(&mut signals);
                    if config.config_file.is_some() {
                        config = self.reload(config, &mut signals).await;
                    }
                    self.publish(&signals);
                }
            }
        }

        info!("Shutting down, stopping {} watchers", signals.len());
        self.probes.set_ready(false);
        await_stopped(stop_all(&mut signals)).await;
        self.publish(&signals);
        info!("Controller stopped");
    }

    /// Re-read the configuration file and apply the change, keeping the
    /// current configuration when the file is unreadable or invalid.
    async fn reload(&self, current: Arc<Config>, signals: &mut StopSignals) -> Arc<Config> {
        match current.reload(|key| std::env::var(key).ok()) {
            Ok(Some(change)) => self.apply_change(change, signals).await,
            Ok(None) => current,
            Err(e) => {
                warn!("Ignoring configuration change: {}", e);
                current
            }
        }
    }

    /// Stop the stale watchers, wait for them, then start the new ones.
    ///
    /// Returns the configuration to keep running with.
    pub async fn apply_change(&self, change: Config, signals: &mut StopSignals) -> Arc<Config> {
        info!(
            "Configuration changed: stopping {:?}, starting {:?}",
            change.stale_resources, change.new_resources
        );

        await_stopped(stop_watchers(signals, &change)).await;

        let change = Arc::new(change);
        if !change.new_resources.is_empty() {
            for (kind, handle) in start_watchers(&self.ctx, &change) {
                if let Some(previous) = signals.insert(kind, handle) {
                    // A restart while the old task still ran; retire it
                    await_stopped(vec![previous.stop()]).await;
                }
            }
        }

        self.publish(signals);
        change
    }

    fn publish(&self, signals: &StopSignals) {
        self.probes.set_watchers(active_kinds(signals));
    }
}

async fn await_stopped(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            error!("Watcher task failed: {}", e);
        }
    }
}
