//! Emitter trait for mocking
//!
//! `HttpEmitter` implements it for real collectors, tests use `MockEmitter`
//! (feature `test-util`).

use crate::error::EmitterError;
use inventory::InventoryRecord;

/// Outbound transmitter of inventory records
#[async_trait::async_trait]
pub trait EmitterTrait: Send + Sync {
    /// Send one record to `destination`
    async fn emit_changes(&self, record: &InventoryRecord, destination: &str) -> Result<(), EmitterError>;
}
