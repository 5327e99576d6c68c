//! Quartermaster Inventory Model
//!
//! Point-in-time facts describing the resources of a Kubernetes cluster, and the
//! identifier generator that stamps every fact with a unique id.
//!
//! # Example
//!
//! ```
//! use inventory::{EventAction, Namespace, UidGenerator};
//!
//! let uids = UidGenerator::new();
//! let ns = Namespace::new("kube-system", EventAction::Created, uids.new_uid());
//! assert_eq!(ns.kind.as_str(), "namespace");
//! ```

pub mod error;
pub mod model;
pub mod uid;

pub use error::InventoryError;
pub use model::*;
pub use uid::{Uid, UidGenerator};
