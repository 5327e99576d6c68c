//! Helper functions for creating Kubernetes objects in tests

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, Namespace, Node, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Label read from nodes to resolve the cluster name
pub const CLUSTER_NAME_LABEL: &str = "cluster-name";

fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        resource_version: Some("1".to_string()),
        ..Default::default()
    }
}

/// Helper to create a Namespace
pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: meta(None, name),
        ..Default::default()
    }
}

/// Helper to create a Deployment with a desired replica count
pub fn deployment(namespace: &str, name: &str, replicas: i32) -> Deployment {
    let mut metadata = meta(Some(namespace), name);
    metadata.labels = Some(BTreeMap::from([("app".to_string(), name.to_string())]));
    Deployment {
        metadata,
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Helper to create a Pod with one container per image
pub fn pod(namespace: &str, name: &str, images: &[&str]) -> Pod {
    let mut metadata = meta(Some(namespace), name);
    metadata.labels = Some(BTreeMap::from([("pod".to_string(), name.to_string())]));
    let containers = images
        .iter()
        .enumerate()
        .map(|(i, image)| Container {
            name: format!("c{i}"),
            image: Some((*image).to_string()),
            ..Default::default()
        })
        .collect();
    Pod {
        metadata,
        spec: Some(PodSpec {
            containers,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Helper to create a Node, optionally carrying the cluster name label
pub fn node(name: &str, cluster_name: Option<&str>) -> Node {
    let mut metadata = meta(None, name);
    metadata.labels = cluster_name
        .map(|cluster| BTreeMap::from([(CLUSTER_NAME_LABEL.to_string(), cluster.to_string())]));
    Node {
        metadata,
        ..Default::default()
    }
}
