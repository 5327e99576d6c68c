//! ResourceClient trait for mocking
//!
//! This trait abstracts the Kubernetes access the inventory controller needs.
//! `KubeResourceClient` implements it against a live API server, tests use
//! `MockResourceClient` (feature `test-util`).

use crate::error::ClusterError;
use crate::notification::NotificationStream;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};

/// Trait for Kubernetes list/watch operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ResourceClientTrait: Send + Sync {
    // Listing
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError>;
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError>;
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError>;
    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError>;

    /// Git version reported by the API server (e.g. `v1.30.2`)
    async fn server_version(&self) -> Result<String, ClusterError>;

    // Subscriptions, scoped to all namespaces
    async fn subscribe_namespaces(&self) -> Result<NotificationStream<Namespace>, ClusterError>;
    async fn subscribe_deployments(&self) -> Result<NotificationStream<Deployment>, ClusterError>;
    async fn subscribe_pods(&self) -> Result<NotificationStream<Pod>, ClusterError>;
}
