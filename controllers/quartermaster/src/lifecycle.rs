//! Watcher lifecycle: starting watchers per configured kind and stopping the
//! stale ones after a configuration change.

use crate::config::Config;
use crate::context::Context;
use crate::watcher::watch;
use inventory::ResourceKind;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A running watcher task and the signal that stops it
#[derive(Debug)]
pub struct WatcherHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Fire the stop signal, returning the task so callers can await its exit
    pub fn stop(self) -> JoinHandle<()> {
        // The receiver is gone only if the task already exited
        let _ = self.stop.send(());
        self.task
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Live watchers keyed by kind configuration name (`namespaces`, ...)
pub type StopSignals = HashMap<String, WatcherHandle>;

/// Spawn one watcher per kind in `config.watch_list()`.
///
/// Unknown names are skipped; a name listed twice gets one watcher.
pub fn start_watchers(ctx: &Context, config: &Arc<Config>) -> StopSignals {
    let mut signals = StopSignals::new();

    for name in config.watch_list() {
        let kind = match name.parse::<ResourceKind>() {
            Ok(kind) => kind,
            Err(e) => {
                debug!("Not watching {}: {}", name, e);
                continue;
            }
        };
        if signals.contains_key(name) {
            continue;
        }

        let (stop, receiver) = oneshot::channel();
        let task = tokio::spawn(watch(kind, ctx.clone(), Arc::clone(config), receiver));
        signals.insert(name.clone(), WatcherHandle { stop, task });
        info!("Started {} watcher", name);
    }

    signals
}

/// Stop every watcher named in `config.stale_resources`.
///
/// Stopped entries are removed from `signals`. Names without a live entry are
/// logged and skipped. Returns the stopped tasks.
pub fn stop_watchers(signals: &mut StopSignals, config: &Config) -> Vec<JoinHandle<()>> {
    let mut stopped = Vec::new();

    for name in &config.stale_resources {
        match signals.remove(name) {
            Some(handle) => {
                info!("Stopping {} watcher", name);
                stopped.push(handle.stop());
            }
            None => warn!("No running watcher for {}, nothing to stop", name),
        }
    }

    stopped
}

/// Stop every watcher, e.g. on shutdown
pub fn stop_all(signals: &mut StopSignals) -> Vec<JoinHandle<()>> {
    signals.drain().map(|(_, handle)| handle.stop()).collect()
}

/// Drop entries whose task already exited (failed subscription, closed
/// stream). Returns the pruned kinds, sorted.
pub fn prune_finished(signals: &mut StopSignals) -> Vec<String> {
    let mut finished: Vec<String> = signals
        .iter()
        .filter(|(_, handle)| handle.is_finished())
        .map(|(kind, _)| kind.clone())
        .collect();
    finished.sort();
    for kind in &finished {
        signals.remove(kind);
        warn!("{} watcher exited on its own", kind);
    }
    finished
}

/// Kinds with a live watcher, sorted. Exited tasks are not counted even
/// before they are pruned.
pub fn active_kinds(signals: &StopSignals) -> Vec<String> {
    let mut kinds: Vec<String> = signals
        .iter()
        .filter(|(_, handle)| !handle.is_finished())
        .map(|(kind, _)| kind.clone())
        .collect();
    kinds.sort();
    kinds
}
