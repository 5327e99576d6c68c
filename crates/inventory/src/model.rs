//! Inventory facts
//!
//! Each fact describes one observed resource at one point in time. Facts are
//! built, handed to the emitter and dropped; nothing here is ever mutated in
//! place.

use crate::error::InventoryError;
use crate::uid::Uid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Resource kinds tracked by the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Namespace,
    Deployment,
    Pod,
}

impl ResourceKind {
    /// All kinds, in the order watchers are started by default
    pub const ALL: [ResourceKind; 3] = [Self::Namespace, Self::Deployment, Self::Pod];

    /// Tag carried by facts of this kind (`namespace`, `deployment`, `pod`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Deployment => "deployment",
            Self::Pod => "pod",
        }
    }

    /// Name used for this kind in watch configuration (`namespaces`, ...)
    #[must_use]
    pub fn config_name(self) -> &'static str {
        match self {
            Self::Namespace => "namespaces",
            Self::Deployment => "deployments",
            Self::Pod => "pods",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = InventoryError;

    /// Parses the configuration name of a kind (`namespaces`, `deployments`, `pods`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.config_name() == s)
            .ok_or_else(|| InventoryError::UnknownKind(s.to_string()))
    }
}

/// Lifecycle action a fact reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Created,
    Deleted,
    Modified,
}

impl EventAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "deleted" => Ok(Self::Deleted),
            "modified" => Ok(Self::Modified),
            other => Err(InventoryError::UnknownAction(other.to_string())),
        }
    }
}

/// Namespace fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub name: String,
    pub event: EventAction,
    pub kind: ResourceKind,
    pub uid: Uid,
}

impl Namespace {
    #[must_use]
    pub fn new(name: impl Into<String>, event: EventAction, uid: Uid) -> Self {
        Self {
            name: name.into(),
            event,
            kind: ResourceKind::Namespace,
            uid,
        }
    }
}

/// Deployment fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Desired replica count from the deployment spec
    pub replicas_desired: u32,
    pub event: EventAction,
    pub kind: ResourceKind,
    pub uid: Uid,
}

impl Deployment {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
        replicas_desired: u32,
        event: EventAction,
        uid: Uid,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels,
            replicas_desired,
            event,
            kind: ResourceKind::Deployment,
            uid,
        }
    }
}

/// Pod fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Container image references, in container order
    #[serde(default)]
    pub images: Vec<String>,
    pub event: EventAction,
    pub kind: ResourceKind,
    pub uid: Uid,
}

impl Pod {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
        images: Vec<String>,
        event: EventAction,
        uid: Uid,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels,
            images,
            event,
            kind: ResourceKind::Pod,
            uid,
        }
    }
}

/// Full inventory of a cluster, assembled by one snapshot pass
///
/// The `deployments` and `pods` maps are keyed by the names of the namespaces
/// collected in the same pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub uid: Uid,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub deployments: BTreeMap<String, Vec<Deployment>>,
    #[serde(default)]
    pub pods: BTreeMap<String, Vec<Pod>>,
}

impl Cluster {
    /// Start an empty cluster inventory
    #[must_use]
    pub fn new(uid: Uid, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
            version: version.into(),
            namespaces: Vec::new(),
            deployments: BTreeMap::new(),
            pods: BTreeMap::new(),
        }
    }
}

/// Anything the emitter can ship to the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum InventoryRecord {
    Cluster(Cluster),
    Namespace(Namespace),
    Deployment(Deployment),
    Pod(Pod),
}

impl InventoryRecord {
    /// Short human readable description used in log lines
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Cluster(c) => format!(
                "cluster {} ({} namespaces)",
                if c.name.is_empty() { "<unnamed>" } else { &c.name },
                c.namespaces.len()
            ),
            Self::Namespace(ns) => format!("namespace {} {}", ns.name, ns.event),
            Self::Deployment(d) => format!("deployment {}/{} {}", d.namespace, d.name, d.event),
            Self::Pod(p) => format!("pod {}/{} {}", p.namespace, p.name, p.event),
        }
    }

    /// Lifecycle action of a single fact; `None` for a full cluster snapshot
    #[must_use]
    pub fn event(&self) -> Option<EventAction> {
        match self {
            Self::Cluster(_) => None,
            Self::Namespace(ns) => Some(ns.event),
            Self::Deployment(d) => Some(d.event),
            Self::Pod(p) => Some(p.event),
        }
    }

    /// Uid of the record
    #[must_use]
    pub fn uid(&self) -> &Uid {
        match self {
            Self::Cluster(c) => &c.uid,
            Self::Namespace(ns) => &ns.uid,
            Self::Deployment(d) => &d.uid,
            Self::Pod(p) => &p.uid,
        }
    }
}

impl From<Cluster> for InventoryRecord {
    fn from(cluster: Cluster) -> Self {
        Self::Cluster(cluster)
    }
}

impl From<Namespace> for InventoryRecord {
    fn from(ns: Namespace) -> Self {
        Self::Namespace(ns)
    }
}

impl From<Deployment> for InventoryRecord {
    fn from(deployment: Deployment) -> Self {
        Self::Deployment(deployment)
    }
}

impl From<Pod> for InventoryRecord {
    fn from(pod: Pod) -> Self {
        Self::Pod(pod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uid::UidGenerator;

    #[test]
    fn test_kind_parses_config_names() {
        assert_eq!("namespaces".parse(), Ok(ResourceKind::Namespace));
        assert_eq!("deployments".parse(), Ok(ResourceKind::Deployment));
        assert_eq!("pods".parse(), Ok(ResourceKind::Pod));
    }

    #[test]
    fn test_kind_rejects_unknown_names() {
        assert_eq!(
            "services".parse::<ResourceKind>(),
            Err(InventoryError::UnknownKind("services".to_string()))
        );
        // Fact tags are not configuration names
        assert!("pod".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_constructors_set_kind_tag() {
        let uids = UidGenerator::new();
        let ns = Namespace::new("default", EventAction::Created, uids.new_uid());
        let dep = Deployment::new("web", "default", BTreeMap::new(), 3, EventAction::Created, uids.new_uid());
        let pod = Pod::new("web-1", "default", BTreeMap::new(), vec![], EventAction::Deleted, uids.new_uid());

        assert_eq!(ns.kind, ResourceKind::Namespace);
        assert_eq!(dep.kind, ResourceKind::Deployment);
        assert_eq!(pod.kind, ResourceKind::Pod);
    }

    #[test]
    fn test_fact_serialization_uses_lowercase_tags() {
        let uids = UidGenerator::new();
        let dep = Deployment::new("web", "shop", BTreeMap::new(), 2, EventAction::Modified, uids.new_uid());
        let json = serde_json::to_value(InventoryRecord::from(dep)).expect("deployment should serialize");

        assert_eq!(json["type"], "deployment");
        assert_eq!(json["data"]["event"], "modified");
        assert_eq!(json["data"]["kind"], "deployment");
        assert_eq!(json["data"]["replicasDesired"], 2);
    }

    #[test]
    fn test_action_round_trips_through_strings() {
        for action in [EventAction::Created, EventAction::Deleted, EventAction::Modified] {
            assert_eq!(action.as_str().parse(), Ok(action));
        }
        assert!("updated".parse::<EventAction>().is_err());
    }

    #[test]
    fn test_record_summary() {
        let uids = UidGenerator::new();
        let pod = Pod::new("api-0", "prod", BTreeMap::new(), vec![], EventAction::Created, uids.new_uid());
        assert_eq!(InventoryRecord::from(pod).summary(), "pod prod/api-0 created");

        let cluster = Cluster::new(uids.new_uid(), "", "v1.30.2");
        let record = InventoryRecord::from(cluster);
        assert_eq!(record.summary(), "cluster <unnamed> (0 namespaces)");
        assert_eq!(record.event(), None);
    }

    #[test]
    fn test_record_uid_is_the_fact_uid() {
        let uids = UidGenerator::new();
        let ns = Namespace::new("default", EventAction::Deleted, uids.new_uid());
        let expected = ns.uid.clone();
        assert_eq!(InventoryRecord::from(ns).uid(), &expected);

        let cluster = Cluster::new(uids.new_uid(), "prod", "v1.30.2");
        let expected = cluster.uid.clone();
        assert_eq!(InventoryRecord::from(cluster).uid(), &expected);
    }
}
