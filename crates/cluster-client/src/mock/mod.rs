//! Mock ResourceClient for unit testing
//!
//! This module provides an in-memory implementation of `ResourceClientTrait`
//! that can be used in unit tests without a running API server.
//!
//! - list results are seeded with `add_*` methods,
//! - individual operations can be made to fail with `fail_*` methods,
//! - each kind has one notification feed; tests push notifications with
//!   `notify_*` and the watcher receives them through `subscribe_*`.
//!
//! `fixtures.rs` holds constructors for the Kubernetes objects themselves.

pub mod fixtures;

use crate::error::ClusterError;
use crate::notification::{Notification, NotificationStream};
use crate::resource_trait::ResourceClientTrait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Notification feed for one resource kind.
///
/// Notifications pushed before the subscription exists are buffered.
#[derive(Debug)]
struct Feed<K> {
    sender: UnboundedSender<Notification<K>>,
    receiver: Mutex<Option<UnboundedReceiver<Notification<K>>>>,
}

impl<K: Send + 'static> Feed<K> {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    fn push(&self, notification: Notification<K>) -> bool {
        self.sender.unbounded_send(notification).is_ok()
    }

    fn take(&self, kind: &str) -> Result<NotificationStream<K>, ClusterError> {
        lock(&self.receiver)
            .take()
            .map(StreamExt::boxed)
            .ok_or_else(|| ClusterError::Subscription {
                kind: kind.to_string(),
                reason: "mock feed already subscribed".to_string(),
            })
    }

    fn is_subscribed(&self) -> bool {
        lock(&self.receiver).is_none()
    }
}

/// Mock ResourceClient for testing
#[derive(Debug, Clone)]
pub struct MockResourceClient {
    pub(crate) namespaces: Arc<Mutex<Vec<Namespace>>>,
    pub(crate) deployments: Arc<Mutex<HashMap<String, Vec<Deployment>>>>,
    pub(crate) pods: Arc<Mutex<HashMap<String, Vec<Pod>>>>,
    pub(crate) nodes: Arc<Mutex<Vec<Node>>>,
    pub(crate) version: Arc<Mutex<String>>,
    /// Operations that should fail, e.g. `list_pods:b` or `subscribe:pods`
    pub(crate) failures: Arc<Mutex<HashSet<String>>>,
    namespace_feed: Arc<Feed<Namespace>>,
    deployment_feed: Arc<Feed<Deployment>>,
    pod_feed: Arc<Feed<Pod>>,
}

impl Default for MockResourceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResourceClient {
    /// Create an empty mock cluster
    pub fn new() -> Self {
        Self {
            namespaces: Arc::new(Mutex::new(Vec::new())),
            deployments: Arc::new(Mutex::new(HashMap::new())),
            pods: Arc::new(Mutex::new(HashMap::new())),
            nodes: Arc::new(Mutex::new(Vec::new())),
            version: Arc::new(Mutex::new("v1.30.0".to_string())),
            failures: Arc::new(Mutex::new(HashSet::new())),
            namespace_feed: Arc::new(Feed::new()),
            deployment_feed: Arc::new(Feed::new()),
            pod_feed: Arc::new(Feed::new()),
        }
    }

    /// Add a namespace to the mock store (for test setup)
    pub fn add_namespace(&self, namespace: Namespace) {
        lock(&self.namespaces).push(namespace);
    }

    /// Add a deployment to the mock store, filed under its own namespace
    pub fn add_deployment(&self, deployment: Deployment) {
        let ns = deployment.metadata.namespace.clone().unwrap_or_default();
        lock(&self.deployments).entry(ns).or_default().push(deployment);
    }

    /// Add a pod to the mock store, filed under its own namespace
    pub fn add_pod(&self, pod: Pod) {
        let ns = pod.metadata.namespace.clone().unwrap_or_default();
        lock(&self.pods).entry(ns).or_default().push(pod);
    }

    /// Add a node to the mock store (for test setup)
    pub fn add_node(&self, node: Node) {
        lock(&self.nodes).push(node);
    }

    /// Set the version reported by `server_version`
    pub fn set_version(&self, version: impl Into<String>) {
        *lock(&self.version) = version.into();
    }

    pub fn fail_list_namespaces(&self) {
        self.fail("list_namespaces".to_string());
    }

    pub fn fail_list_deployments(&self, namespace: &str) {
        self.fail(format!("list_deployments:{namespace}"));
    }

    pub fn fail_list_pods(&self, namespace: &str) {
        self.fail(format!("list_pods:{namespace}"));
    }

    pub fn fail_list_nodes(&self) {
        self.fail("list_nodes".to_string());
    }

    pub fn fail_server_version(&self) {
        self.fail("server_version".to_string());
    }

    /// Make `subscribe_*` fail for a kind (`namespaces`, `deployments`, `pods`)
    pub fn fail_subscribe(&self, kind: &str) {
        self.fail(format!("subscribe:{kind}"));
    }

    /// Push a namespace notification; `false` once the subscriber is gone
    pub fn notify_namespace(&self, notification: Notification<Namespace>) -> bool {
        self.namespace_feed.push(notification)
    }

    /// Push a deployment notification; `false` once the subscriber is gone
    pub fn notify_deployment(&self, notification: Notification<Deployment>) -> bool {
        self.deployment_feed.push(notification)
    }

    /// Push a pod notification; `false` once the subscriber is gone
    pub fn notify_pod(&self, notification: Notification<Pod>) -> bool {
        self.pod_feed.push(notification)
    }

    /// Whether a watcher has taken the feed for `kind`
    pub fn is_subscribed(&self, kind: &str) -> bool {
        match kind {
            "namespaces" => self.namespace_feed.is_subscribed(),
            "deployments" => self.deployment_feed.is_subscribed(),
            "pods" => self.pod_feed.is_subscribed(),
            _ => false,
        }
    }

    fn fail(&self, key: String) {
        lock(&self.failures).insert(key);
    }

    fn check(&self, key: &str) -> Result<(), ClusterError> {
        if lock(&self.failures).contains(key) {
            return Err(ClusterError::List(key.to_string(), "injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ResourceClientTrait for MockResourceClient {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        self.check("list_namespaces")?;
        Ok(lock(&self.namespaces).clone())
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        self.check(&format!("list_deployments:{namespace}"))?;
        Ok(lock(&self.deployments).get(namespace).cloned().unwrap_or_default())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        self.check(&format!("list_pods:{namespace}"))?;
        Ok(lock(&self.pods).get(namespace).cloned().unwrap_or_default())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError> {
        self.check("list_nodes")?;
        Ok(lock(&self.nodes).clone())
    }

    async fn server_version(&self) -> Result<String, ClusterError> {
        self.check("server_version")?;
        Ok(lock(&self.version).clone())
    }

    async fn subscribe_namespaces(&self) -> Result<NotificationStream<Namespace>, ClusterError> {
        self.subscription_check("namespaces")?;
        self.namespace_feed.take("namespaces")
    }

    async fn subscribe_deployments(&self) -> Result<NotificationStream<Deployment>, ClusterError> {
        self.subscription_check("deployments")?;
        self.deployment_feed.take("deployments")
    }

    async fn subscribe_pods(&self) -> Result<NotificationStream<Pod>, ClusterError> {
        self.subscription_check("pods")?;
        self.pod_feed.take("pods")
    }
}

impl MockResourceClient {
    fn subscription_check(&self, kind: &str) -> Result<(), ClusterError> {
        if lock(&self.failures).contains(&format!("subscribe:{kind}")) {
            return Err(ClusterError::Subscription {
                kind: kind.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}
