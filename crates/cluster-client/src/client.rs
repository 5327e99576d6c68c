//! Kubernetes API client
//!
//! Implements [`ResourceClientTrait`] on top of kube-rs. Lists go straight to
//! the API server, subscriptions run a `kube_runtime::watcher` across all
//! namespaces and classify its events with a [`NotificationTracker`].

use crate::error::ClusterError;
use crate::notification::{NotificationStream, NotificationTracker};
use crate::resource_trait::ResourceClientTrait;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use kube::api::ListParams;
use kube::{Api, Client, Resource};
use kube_runtime::{watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, warn};

/// Kubernetes API client
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl fmt::Debug for KubeResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeResourceClient").finish_non_exhaustive()
    }
}

impl KubeResourceClient {
    /// Wrap an existing kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient kubeconfig or in-cluster service account
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Config(e.to_string()))?;
        Ok(Self::new(client))
    }

    /// Start a watch over every object of kind `K` in the cluster.
    ///
    /// A one-item list is issued first so missing RBAC grants or an unreachable
    /// API server fail the subscription instead of looping inside the watcher
    /// backoff. Errors after that point are logged and retried by the watcher.
    async fn subscribe<K>(&self, kind: &'static str) -> Result<NotificationStream<K>, ClusterError>
    where
        K: Resource + Clone + DeserializeOwned + fmt::Debug + Send + Sync + 'static,
        K::DynamicType: Default + Eq + std::hash::Hash + Clone,
    {
        let api: Api<K> = Api::all(self.client.clone());

        api.list_metadata(&ListParams::default().limit(1))
            .await
            .map_err(|e| ClusterError::Subscription {
                kind: kind.to_string(),
                reason: e.to_string(),
            })?;
        debug!("Subscribing to {} across all namespaces", kind);

        let mut tracker = NotificationTracker::new();
        let stream = watcher(api, watcher::Config::default())
            .default_backoff()
            .filter_map(move |result| async move {
                match result {
                    Ok(event) => Some(event),
                    Err(e) => {
                        warn!("Watch stream error for {}: {}", kind, e);
                        None
                    }
                }
            })
            .flat_map(move |event| futures::stream::iter(tracker.observe(event)))
            .boxed();

        Ok(stream)
    }
}

#[async_trait::async_trait]
impl ResourceClientTrait for KubeResourceClient {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn server_version(&self) -> Result<String, ClusterError> {
        let info = self.client.apiserver_version().await?;
        Ok(info.git_version)
    }

    async fn subscribe_namespaces(&self) -> Result<NotificationStream<Namespace>, ClusterError> {
        self.subscribe("namespaces").await
    }

    async fn subscribe_deployments(&self) -> Result<NotificationStream<Deployment>, ClusterError> {
        self.subscribe("deployments").await
    }

    async fn subscribe_pods(&self) -> Result<NotificationStream<Pod>, ClusterError> {
        self.subscribe("pods").await
    }
}
