//! Shared collaborators handed to the snapshot builder and every watcher task.

use crate::config::Config;
use cluster_client::ResourceClientTrait;
use collector_client::EmitterTrait;
use inventory::{InventoryRecord, UidGenerator};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resource client, emitter and identifier generator, cheap to clone
#[derive(Clone)]
pub struct Context {
    pub client: Arc<dyn ResourceClientTrait>,
    pub emitter: Arc<dyn EmitterTrait>,
    pub uids: Arc<UidGenerator>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("uids", &self.uids).finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        client: Arc<dyn ResourceClientTrait>,
        emitter: Arc<dyn EmitterTrait>,
        uids: Arc<UidGenerator>,
    ) -> Self {
        Self { client, emitter, uids }
    }

    /// Ship one record to the configured collector.
    ///
    /// Best effort: failures and timeouts are logged and the record is dropped.
    /// Returns whether the collector accepted it.
    pub async fn emit(&self, record: InventoryRecord, config: &Config) -> bool {
        let send = self.emitter.emit_changes(&record, &config.remote_endpoint);
        match tokio::time::timeout(config.emit_timeout, send).await {
            Ok(Ok(())) => {
                debug!("Emitted {} as {}", record.summary(), record.uid());
                true
            }
            Ok(Err(e)) => {
                warn!("Failed to emit {}: {}", record.summary(), e);
                false
            }
            Err(_) => {
                warn!(
                    "Emitting {} timed out after {:?}, dropping it",
                    record.summary(),
                    config.emit_timeout
                );
                false
            }
        }
    }
}
