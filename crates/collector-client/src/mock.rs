//! Mock emitter for unit testing
//!
//! Records every emitted record in memory instead of sending it anywhere. It
//! can be told to fail, or to stall for a while before answering, to exercise
//! the caller's error and timeout handling.

use crate::emitter_trait::EmitterTrait;
use crate::error::EmitterError;
use inventory::{InventoryRecord, ResourceKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock emitter for testing
#[derive(Debug, Clone, Default)]
pub struct MockEmitter {
    pub(crate) emitted: Arc<Mutex<Vec<(InventoryRecord, String)>>>,
    pub(crate) failing: Arc<AtomicBool>,
    pub(crate) delay: Arc<Mutex<Option<Duration>>>,
}

impl MockEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following emission fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stall every following emission for `delay` before recording it
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    /// All records emitted so far, in emission order
    pub fn records(&self) -> Vec<InventoryRecord> {
        lock(&self.emitted).iter().map(|(record, _)| record.clone()).collect()
    }

    /// Destinations used so far, in emission order
    pub fn destinations(&self) -> Vec<String> {
        lock(&self.emitted).iter().map(|(_, dest)| dest.clone()).collect()
    }

    /// Records of one kind of fact (cluster snapshots are never included)
    pub fn records_of(&self, kind: ResourceKind) -> Vec<InventoryRecord> {
        self.records()
            .into_iter()
            .filter(|record| {
                matches!(
                    (record, kind),
                    (InventoryRecord::Namespace(_), ResourceKind::Namespace)
                        | (InventoryRecord::Deployment(_), ResourceKind::Deployment)
                        | (InventoryRecord::Pod(_), ResourceKind::Pod)
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.emitted).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` records were emitted, or `timeout` elapses.
    ///
    /// Returns whether the count was reached.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.len() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait::async_trait]
impl EmitterTrait for MockEmitter {
    async fn emit_changes(&self, record: &InventoryRecord, destination: &str) -> Result<(), EmitterError> {
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmitterError::Api(format!("mock failure for {}", record.summary())));
        }
        lock(&self.emitted).push((record.clone(), destination.to_string()));
        Ok(())
    }
}
