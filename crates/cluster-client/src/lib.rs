//! Kubernetes Cluster Client
//!
//! List and watch access to the resources the inventory controller tracks:
//! namespaces, deployments, pods, nodes and the API server version.
//!
//! Watches are exposed as typed [`NotificationStream`]s. The resource kind is
//! fixed when the subscription is created, and every item is already classified
//! as appeared, changed or disappeared. Dropping the stream closes the watch.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{KubeResourceClient, Notification, ResourceClientTrait};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeResourceClient::try_default().await?;
//!
//! for ns in client.list_namespaces().await? {
//!     println!("{:?}", ns.metadata.name);
//! }
//!
//! let mut pods = client.subscribe_pods().await?;
//! while let Some(notification) = pods.next().await {
//!     if let Notification::Appeared(pod) = notification {
//!         println!("new pod {:?}", pod.metadata.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod notification;
#[path = "trait.rs"]
pub mod resource_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeResourceClient;
pub use error::ClusterError;
pub use notification::{Notification, NotificationStream, NotificationTracker};
pub use resource_trait::ResourceClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockResourceClient;

/// Re-exported Kubernetes object types handled by the client
pub mod objects {
    pub use k8s_openapi::api::apps::v1::Deployment;
    pub use k8s_openapi::api::core::v1::{Container, Namespace, Node, Pod};
}
