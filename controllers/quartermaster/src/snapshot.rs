//! Full cluster snapshot.
//!
//! Lists every namespace, and the deployments and pods inside each one, into a
//! single [`Cluster`] value and hands it to the emitter. Listing is sequential
//! and failures only shrink the snapshot: an error is logged and the affected
//! collection is left empty.

use crate::config::Config;
use crate::context::Context;
use crate::facts::{deployment_fact, namespace_fact, pod_fact};
use cluster_client::ResourceClientTrait;
use inventory::{Cluster, EventAction};
use kube::ResourceExt;
use tracing::{error, info, warn};

/// Node label holding the cluster name
pub const CLUSTER_NAME_LABEL: &str = "cluster-name";

/// Build one snapshot and emit it. Nothing is returned; failures are logged.
pub async fn initialize(ctx: &Context, config: &Config) {
    let cluster = build_snapshot(ctx).await;
    ctx.emit(cluster.into(), config).await;
}

/// Enumerate the cluster into a fresh [`Cluster`] value
pub async fn build_snapshot(ctx: &Context) -> Cluster {
    let client = ctx.client.as_ref();
    let uids = ctx.uids.as_ref();

    let version = server_version(client).await;
    let name = cluster_name(client).await;
    let mut cluster = Cluster::new(uids.new_uid(), name, version);

    // Deployments and pods are keyed by namespace, so namespaces drive the walk
    let namespaces = client.list_namespaces().await.unwrap_or_else(|e| {
        error!("Could not get namespaces: {}", e);
        Vec::new()
    });

    for ns in &namespaces {
        let ns_name = ns.name_any();
        cluster.namespaces.push(namespace_fact(ns, EventAction::Created, uids));

        let deployments = client.list_deployments(&ns_name).await.unwrap_or_else(|e| {
            error!("Could not get deployments in {}: {}", ns_name, e);
            Vec::new()
        });
        cluster.deployments.insert(
            ns_name.clone(),
            deployments
                .iter()
                .map(|d| deployment_fact(d, EventAction::Created, uids))
                .collect(),
        );

        let pods = client.list_pods(&ns_name).await.unwrap_or_else(|e| {
            error!("Could not get pods in {}: {}", ns_name, e);
            Vec::new()
        });
        cluster.pods.insert(
            ns_name,
            pods.iter().map(|p| pod_fact(p, EventAction::Created, uids)).collect(),
        );
    }

    info!(
        "Constructed cluster snapshot {}: {} namespaces, {} deployments, {} pods",
        cluster.uid,
        cluster.namespaces.len(),
        cluster.deployments.values().map(Vec::len).sum::<usize>(),
        cluster.pods.values().map(Vec::len).sum::<usize>()
    );

    cluster
}

/// API server git version, empty when discovery fails
pub async fn server_version(client: &dyn ResourceClientTrait) -> String {
    client.server_version().await.unwrap_or_else(|e| {
        error!("Could not get server version: {}", e);
        String::new()
    })
}

/// Cluster name from the `cluster-name` label of the first listed node.
///
/// Empty when nodes cannot be listed, there are none, or the label is missing.
pub async fn cluster_name(client: &dyn ResourceClientTrait) -> String {
    let nodes = match client.list_nodes().await {
        Ok(nodes) => nodes,
        Err(e) => {
            error!("Could not get nodes: {}", e);
            return String::new();
        }
    };

    let Some(node) = nodes.first() else {
        warn!("No nodes listed, cluster name left empty");
        return String::new();
    };

    match node.labels().get(CLUSTER_NAME_LABEL) {
        Some(name) => name.clone(),
        None => {
            warn!("Node {} has no {} label, cluster name left empty", node.name_any(), CLUSTER_NAME_LABEL);
            String::new()
        }
    }
}
