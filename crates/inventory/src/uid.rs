//! Unique identifier generation
//!
//! Every inventory fact is stamped with a time-based (UUID v1) identifier.
//! Two v1 UUIDs generated inside the same clock tick can be identical, so the
//! generator remembers the last value it issued and spins until the clock
//! produces a different one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Identifier carried by every inventory fact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Borrow the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

/// Process-wide source of unique identifiers.
///
/// One instance is shared (behind an `Arc`) by the snapshot builder and every
/// watcher task. The generate, compare, record sequence runs under a single
/// lock so concurrent callers never receive the same identifier.
#[derive(Debug)]
pub struct UidGenerator {
    node_id: [u8; 6],
    last_issued: Mutex<Option<Uuid>>,
}

impl UidGenerator {
    /// Create a generator with a random node id
    #[must_use]
    pub fn new() -> Self {
        let seed = Uuid::new_v4();
        let mut node_id = [0u8; 6];
        node_id.copy_from_slice(&seed.as_bytes()[..6]);
        // Random node ids must set the multicast bit (RFC 4122 section 4.5)
        node_id[0] |= 0x01;
        Self::with_node_id(node_id)
    }

    /// Create a generator with a fixed node id
    #[must_use]
    pub fn with_node_id(node_id: [u8; 6]) -> Self {
        Self {
            node_id,
            last_issued: Mutex::new(None),
        }
    }

    /// Issue a new identifier, distinct from the previously issued one
    pub fn new_uid(&self) -> Uid {
        // The guarded value is a plain Option, a poisoned lock still holds a valid one
        let mut last_issued = self.last_issued.lock().unwrap_or_else(PoisonError::into_inner);

        let mut candidate = Uuid::now_v1(&self.node_id);
        while *last_issued == Some(candidate) {
            candidate = Uuid::now_v1(&self.node_id);
        }
        *last_issued = Some(candidate);

        Uid(candidate.hyphenated().to_string())
    }
}

impl Default for UidGenerator {
    fn default() -> Self {
        Self::new()
    }
}
