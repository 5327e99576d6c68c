//! Unit tests for starting and stopping watchers

#[cfg(test)]
mod tests {
    use crate::lifecycle::*;
    use crate::test_utils::*;
    use cluster_client::mock::fixtures::{deployment, pod};
    use cluster_client::Notification;
    use futures::future::join_all;
    use inventory::ResourceKind;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_watchers_spawns_one_task_per_kind() {
        let (ctx, client, _emitter) = test_context();
        let config = Arc::new(test_config(&["namespaces", "deployments", "pods"]));

        let mut signals = start_watchers(&ctx, &config);

        assert_eq!(active_kinds(&signals), vec!["deployments", "namespaces", "pods"]);
        for kind in ["namespaces", "deployments", "pods"] {
            wait_subscribed(&client, kind).await;
        }

        join_all(stop_all(&mut signals)).await;
        assert!(signals.is_empty());
    }

    #[tokio::test]
    async fn test_start_watchers_ignores_unknown_and_duplicate_kinds() {
        let (ctx, _client, _emitter) = test_context();
        let config = Arc::new(test_config(&["pods", "services", "pods", "Pods"]));

        let mut signals = start_watchers(&ctx, &config);

        assert_eq!(active_kinds(&signals), vec!["pods"]);
        join_all(stop_all(&mut signals)).await;
    }

    #[tokio::test]
    async fn test_start_watchers_prefers_new_resources() {
        let (ctx, client, _emitter) = test_context();
        let mut config = test_config(&["namespaces", "deployments", "pods"]);
        config.new_resources = vec!["deployments".to_string()];

        let mut signals = start_watchers(&ctx, &Arc::new(config));

        assert_eq!(active_kinds(&signals), vec!["deployments"]);
        wait_subscribed(&client, "deployments").await;
        assert!(!client.is_subscribed("pods"));
        join_all(stop_all(&mut signals)).await;
    }

    #[tokio::test]
    async fn test_stopping_pods_leaves_deployments_running() {
        let (ctx, client, emitter) = test_context();
        let config = Arc::new(test_config(&["pods", "deployments"]));
        let mut signals = start_watchers(&ctx, &config);

        client.notify_pod(Notification::Appeared(pod("a", "p1", &[])));
        client.notify_deployment(Notification::Appeared(deployment("a", "d1", 1)));
        assert!(emitter.wait_for(2, WAIT).await);

        let mut stale = test_config(&["deployments"]);
        stale.stale_resources = vec!["pods".to_string()];
        let stopped = stop_watchers(&mut signals, &stale);
        assert_eq!(stopped.len(), 1);
        for task in stopped {
            tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
        }
        assert_eq!(active_kinds(&signals), vec!["deployments"]);

        // pods emits nothing further, deployments keeps going
        assert!(!client.notify_pod(Notification::Appeared(pod("a", "p2", &[]))));
        client.notify_deployment(Notification::Disappeared(deployment("a", "d1", 1)));
        assert!(emitter.wait_for(3, WAIT).await);

        assert_eq!(emitter.records_of(ResourceKind::Pod).len(), 1);
        assert_eq!(emitter.records_of(ResourceKind::Deployment).len(), 2);
        assert!(!signals["deployments"].is_finished());

        join_all(stop_all(&mut signals)).await;
    }

    #[tokio::test]
    async fn test_stopping_unknown_or_stopped_kind_is_noop() {
        let (ctx, _client, _emitter) = test_context();
        let config = Arc::new(test_config(&["namespaces"]));
        let mut signals = start_watchers(&ctx, &config);

        let mut stale = test_config(&[]);
        stale.stale_resources = vec!["pods".to_string(), "services".to_string()];
        assert!(stop_watchers(&mut signals, &stale).is_empty());
        assert_eq!(active_kinds(&signals), vec!["namespaces"]);

        stale.stale_resources = vec!["namespaces".to_string()];
        join_all(stop_watchers(&mut signals, &stale)).await;
        // A second stop of the same kind finds nothing
        assert!(stop_watchers(&mut signals, &stale).is_empty());
        assert!(signals.is_empty());
    }

    #[tokio::test]
    async fn test_failed_subscription_is_not_active() {
        let (ctx, client, _emitter) = test_context();
        client.fail_subscribe("pods");
        let config = Arc::new(test_config(&["pods", "namespaces"]));
        let mut signals = start_watchers(&ctx, &config);

        tokio::time::timeout(WAIT, async {
            while !signals["pods"].is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(active_kinds(&signals), vec!["namespaces"]);
        assert_eq!(prune_finished(&mut signals), vec!["pods"]);
        assert!(!signals.contains_key("pods"));
        assert!(prune_finished(&mut signals).is_empty());

        // Stopping the pruned kind later is the usual warn-and-skip
        let mut stale = test_config(&[]);
        stale.stale_resources = vec!["pods".to_string()];
        assert!(stop_watchers(&mut signals, &stale).is_empty());

        join_all(stop_all(&mut signals)).await;
    }

    #[tokio::test]
    async fn test_restart_with_spent_feed_exits_quietly() {
        let (ctx, client, emitter) = test_context();
        let config = Arc::new(test_config(&["pods"]));
        let mut signals = start_watchers(&ctx, &config);
        wait_subscribed(&client, "pods").await;

        join_all(stop_all(&mut signals)).await;

        // The mock feed is single use, so a second subscription fails and the
        // new watcher exits on its own without emitting.
        let signals = start_watchers(&ctx, &config);
        let handle = signals.into_values().next().unwrap();
        tokio::time::timeout(WAIT, async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(emitter.is_empty());
    }
}
