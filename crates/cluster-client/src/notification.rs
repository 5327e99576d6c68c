//! Change notifications
//!
//! `kube_runtime::watcher` reports objects as applied or deleted and replays the
//! full collection after every (re)list. Inventory consumers want to know
//! whether an object is new, changed or gone, so [`NotificationTracker`] keeps
//! the last seen version of every object and classifies watcher events.

use futures::stream::BoxStream;
use kube::{Resource, ResourceExt};
use kube_runtime::watcher;
use std::collections::{HashMap, HashSet};

/// One classified change of a watched object
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<K> {
    /// The object was not known before
    Appeared(K),
    /// A known object was updated
    Changed(K),
    /// The object is gone
    Disappeared(K),
}

impl<K> Notification<K> {
    /// The object this notification is about
    pub fn object(&self) -> &K {
        match self {
            Self::Appeared(obj) | Self::Changed(obj) | Self::Disappeared(obj) => obj,
        }
    }
}

/// Stream of notifications for a single resource kind
pub type NotificationStream<K> = BoxStream<'static, Notification<K>>;

/// Classifies raw watcher events into [`Notification`]s
#[derive(Debug)]
pub struct NotificationTracker<K> {
    known: HashMap<String, K>,
    /// Keys seen since the last `Init`, while a relist is in progress
    relisting: Option<HashSet<String>>,
}

impl<K> Default for NotificationTracker<K> {
    fn default() -> Self {
        Self {
            known: HashMap::new(),
            relisting: None,
        }
    }
}

impl<K> NotificationTracker<K>
where
    K: Resource + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently believed to exist
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Feed one watcher event, returning the notifications it produces (in order)
    pub fn observe(&mut self, event: watcher::Event<K>) -> Vec<Notification<K>> {
        match event {
            watcher::Event::Init => {
                self.relisting = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(obj) => {
                let key = object_key(&obj);
                if let Some(seen) = self.relisting.as_mut() {
                    seen.insert(key.clone());
                }
                self.apply(key, obj).into_iter().collect()
            }
            watcher::Event::InitDone => {
                let Some(seen) = self.relisting.take() else {
                    return Vec::new();
                };
                // Anything known before the relist but not listed again was deleted
                // while the watch was down.
                let mut gone: Vec<String> = self
                    .known
                    .keys()
                    .filter(|key| !seen.contains(*key))
                    .cloned()
                    .collect();
                gone.sort();
                gone.into_iter()
                    .filter_map(|key| self.known.remove(&key))
                    .map(Notification::Disappeared)
                    .collect()
            }
            watcher::Event::Apply(obj) => {
                let key = object_key(&obj);
                self.apply(key, obj).into_iter().collect()
            }
            watcher::Event::Delete(obj) => {
                self.known.remove(&object_key(&obj));
                vec![Notification::Disappeared(obj)]
            }
        }
    }

    fn apply(&mut self, key: String, obj: K) -> Option<Notification<K>> {
        match self.known.insert(key, obj.clone()) {
            None => Some(Notification::Appeared(obj)),
            Some(previous) => {
                let unchanged = previous.meta().resource_version.is_some()
                    && previous.meta().resource_version == obj.meta().resource_version;
                if unchanged {
                    None
                } else {
                    Some(Notification::Changed(obj))
                }
            }
        }
    }
}

fn object_key<K: Resource>(obj: &K) -> String {
    match obj.namespace() {
        Some(ns) => format!("{}/{}", ns, obj.name_any()),
        None => obj.name_any(),
    }
}
