//! Per-kind resource watchers.
//!
//! Each watcher subscribes to one resource kind across all namespaces, turns
//! every notification into a fact and emits it, until its stop signal fires.
//! All kinds share the generic `run()` helper; only the subscription call and
//! the fact constructor differ.

use crate::config::Config;
use crate::context::Context;
use crate::facts::{deployment_fact, namespace_fact, pod_fact};
use cluster_client::{ClusterError, Notification, NotificationStream};
use futures::StreamExt;
use inventory::{EventAction, InventoryRecord, ResourceKind, UidGenerator};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Watch `kind` until `stop` fires (or its sender is dropped).
///
/// Never returns an error: a failed subscription is logged and the watcher
/// exits without retrying.
pub async fn watch(kind: ResourceKind, ctx: Context, config: Arc<Config>, mut stop: oneshot::Receiver<()>) {
    let client = Arc::clone(&ctx.client);
    match kind {
        ResourceKind::Namespace => {
            run(kind, &ctx, &config, &mut stop, client.subscribe_namespaces(), namespace_fact).await
        }
        ResourceKind::Deployment => {
            run(kind, &ctx, &config, &mut stop, client.subscribe_deployments(), deployment_fact).await
        }
        ResourceKind::Pod => run(kind, &ctx, &config, &mut stop, client.subscribe_pods(), pod_fact).await,
    }
}

/// Action reported for a notification of `kind`, `None` when it is ignored.
///
/// Only pods report in-place changes; namespace and deployment updates are dropped.
pub fn event_action<K>(kind: ResourceKind, notification: &Notification<K>) -> Option<EventAction> {
    match notification {
        Notification::Appeared(_) => Some(EventAction::Created),
        Notification::Disappeared(_) => Some(EventAction::Deleted),
        Notification::Changed(_) if kind == ResourceKind::Pod => Some(EventAction::Modified),
        Notification::Changed(_) => None,
    }
}

async fn run<K, S, F, R>(
    kind: ResourceKind,
    ctx: &Context,
    config: &Config,
    stop: &mut oneshot::Receiver<()>,
    subscribe: S,
    to_fact: F,
) where
    S: Future<Output = Result<NotificationStream<K>, ClusterError>>,
    F: Fn(&K, EventAction, &UidGenerator) -> R,
    R: Into<InventoryRecord>,
{
    info!("Starting {} watcher", kind.config_name());

    let mut stream = tokio::select! {
        biased;
        _ = &mut *stop => {
            info!("{} watcher stopped before subscribing", kind.config_name());
            return;
        }
        subscription = subscribe => match subscription {
            Ok(stream) => stream,
            Err(e) => {
                error!("Could not watch {}: {}", kind.config_name(), e);
                return;
            }
        },
    };

    loop {
        tokio::select! {
            biased;
            _ = &mut *stop => {
                info!("Stopping {} watcher", kind.config_name());
                break;
            }
            next = stream.next() => {
                let Some(notification) = next else {
                    warn!("{} subscription closed by the server side", kind.config_name());
                    break;
                };
                let Some(event) = event_action(kind, &notification) else {
                    debug!("Ignoring {} change notification", kind);
                    continue;
                };
                let record = to_fact(notification.object(), event, ctx.uids.as_ref()).into();
                ctx.emit(record, config).await;
            }
        }
    }

    drop(stream);
    info!("{} watcher stopped", kind.config_name());
}
