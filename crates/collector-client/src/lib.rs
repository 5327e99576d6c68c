//! Inventory Collector Client
//!
//! Ships inventory records (full cluster snapshots and single facts) to the
//! remote collector. Delivery is best effort: callers log failures and move on,
//! nothing here retries.
//!
//! # Example
//!
//! ```no_run
//! use collector_client::{EmitterTrait, HttpEmitter};
//! use inventory::{EventAction, InventoryRecord, Namespace, UidGenerator};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let emitter = HttpEmitter::new(Duration::from_secs(10))?;
//! let uids = UidGenerator::new();
//! let record = InventoryRecord::from(Namespace::new("default", EventAction::Created, uids.new_uid()));
//! emitter.emit_changes(&record, "http://collector:8080/inventory").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod emitter_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{Envelope, HttpEmitter};
pub use emitter_trait::EmitterTrait;
pub use error::EmitterError;
#[cfg(feature = "test-util")]
pub use mock::MockEmitter;
