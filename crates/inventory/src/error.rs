//! Inventory model errors

use thiserror::Error;

/// Errors raised while interpreting inventory tags
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// Resource kind name not known to the inventory
    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),

    /// Lifecycle action name not known to the inventory
    #[error("Unknown event action: {0}")]
    UnknownAction(String),
}
