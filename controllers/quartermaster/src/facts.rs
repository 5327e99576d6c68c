//! Conversion of Kubernetes objects into inventory facts.
//!
//! Used by both the snapshot builder and the resource watchers, so a pod seen
//! at startup and a pod seen by the watcher produce identically shaped facts.

use cluster_client::objects::{Container, Deployment, Namespace, Pod};
use inventory::{EventAction, UidGenerator};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::warn;

/// Replica count assumed by the API server when a deployment omits it
const DEFAULT_REPLICAS: i32 = 1;

/// Build a namespace fact
pub fn namespace_fact(ns: &Namespace, event: EventAction, uids: &UidGenerator) -> inventory::Namespace {
    inventory::Namespace::new(ns.name_any(), event, uids.new_uid())
}

/// Build a deployment fact
pub fn deployment_fact(
    deployment: &Deployment,
    event: EventAction,
    uids: &UidGenerator,
) -> inventory::Deployment {
    inventory::Deployment::new(
        deployment.name_any(),
        deployment.namespace().unwrap_or_default(),
        labels(deployment.metadata.labels.as_ref()),
        desired_replicas(deployment),
        event,
        uids.new_uid(),
    )
}

/// Build a pod fact
pub fn pod_fact(pod: &Pod, event: EventAction, uids: &UidGenerator) -> inventory::Pod {
    let images = pod
        .spec
        .as_ref()
        .map(|spec| images_from_containers(&spec.containers))
        .unwrap_or_default();

    inventory::Pod::new(
        pod.name_any(),
        pod.namespace().unwrap_or_default(),
        labels(pod.metadata.labels.as_ref()),
        images,
        event,
        uids.new_uid(),
    )
}

/// Image reference of every container, in container order.
///
/// A container without an image keeps its slot as an empty string so positions
/// still line up with the pod spec.
pub fn images_from_containers(containers: &[Container]) -> Vec<String> {
    containers
        .iter()
        .map(|container| container.image.clone().unwrap_or_default())
        .collect()
}

/// Desired replicas from the deployment spec, never negative
pub fn desired_replicas(deployment: &Deployment) -> u32 {
    let replicas = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(DEFAULT_REPLICAS);

    u32::try_from(replicas).unwrap_or_else(|_| {
        warn!(
            "Deployment {}/{} reports negative replicas ({}), recording 0",
            deployment.namespace().unwrap_or_default(),
            deployment.name_any(),
            replicas
        );
        0
    })
}

fn labels(labels: Option<&BTreeMap<String, String>>) -> BTreeMap<String, String> {
    labels.cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_client::mock::fixtures;
    use inventory::ResourceKind;

    #[test]
    fn test_images_keep_container_order() {
        let pod = fixtures::pod("default", "web", &["a:1", "b:2"]);
        let fact = pod_fact(&pod, EventAction::Created, &UidGenerator::new());
        assert_eq!(fact.images, vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_pod_without_containers_has_no_images() {
        let pod = fixtures::pod("default", "empty", &[]);
        let fact = pod_fact(&pod, EventAction::Created, &UidGenerator::new());
        assert!(fact.images.is_empty());

        let mut no_spec = fixtures::pod("default", "bare", &[]);
        no_spec.spec = None;
        let fact = pod_fact(&no_spec, EventAction::Created, &UidGenerator::new());
        assert!(fact.images.is_empty());
    }

    #[test]
    fn test_container_without_image_keeps_its_slot() {
        let mut pod = fixtures::pod("default", "web", &["a:1", "b:2"]);
        if let Some(spec) = pod.spec.as_mut() {
            spec.containers[0].image = None;
        }
        let fact = pod_fact(&pod, EventAction::Created, &UidGenerator::new());
        assert_eq!(fact.images, vec!["", "b:2"]);
    }

    #[test]
    fn test_deployment_fact_copies_metadata_and_replicas() {
        let deployment = fixtures::deployment("shop", "cart", 3);
        let fact = deployment_fact(&deployment, EventAction::Deleted, &UidGenerator::new());

        assert_eq!(fact.name, "cart");
        assert_eq!(fact.namespace, "shop");
        assert_eq!(fact.replicas_desired, 3);
        assert_eq!(fact.labels.get("app").map(String::as_str), Some("cart"));
        assert_eq!(fact.event, EventAction::Deleted);
        assert_eq!(fact.kind, ResourceKind::Deployment);
    }

    #[test]
    fn test_replicas_default_and_negative() {
        let mut deployment = fixtures::deployment("shop", "cart", 3);
        if let Some(spec) = deployment.spec.as_mut() {
            spec.replicas = None;
        }
        assert_eq!(desired_replicas(&deployment), 1);

        if let Some(spec) = deployment.spec.as_mut() {
            spec.replicas = Some(-2);
        }
        assert_eq!(desired_replicas(&deployment), 0);
    }

    #[test]
    fn test_facts_for_same_object_get_distinct_uids() {
        let uids = UidGenerator::new();
        let pod = fixtures::pod("default", "web", &[]);
        let created = pod_fact(&pod, EventAction::Created, &uids);
        let deleted = pod_fact(&pod, EventAction::Deleted, &uids);
        assert_ne!(created.uid, deleted.uid);
    }
}
