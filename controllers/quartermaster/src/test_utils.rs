//! Test utilities for unit testing the snapshot builder, watchers and lifecycle
//!
//! This module provides helpers for wiring mock collaborators into a `Context`.

#[cfg(test)]
use crate::config::Config;
#[cfg(test)]
use crate::context::Context;
#[cfg(test)]
use cluster_client::MockResourceClient;
#[cfg(test)]
use collector_client::MockEmitter;
#[cfg(test)]
use inventory::UidGenerator;
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

/// How long tests wait for asynchronous emissions before giving up
#[cfg(test)]
pub const WAIT: Duration = Duration::from_secs(2);

/// Helper to create a context backed by a mock cluster and a mock emitter.
///
/// The mocks are returned alongside so tests can seed data and inspect output.
#[cfg(test)]
pub fn test_context() -> (Context, MockResourceClient, MockEmitter) {
    let client = MockResourceClient::new();
    let emitter = MockEmitter::new();
    let ctx = Context::new(
        Arc::new(client.clone()),
        Arc::new(emitter.clone()),
        Arc::new(UidGenerator::new()),
    );
    (ctx, client, emitter)
}

/// Helper to create a config watching `kinds` (configuration names)
#[cfg(test)]
pub fn test_config(kinds: &[&str]) -> Config {
    Config {
        remote_endpoint: "http://collector.test/inventory".to_string(),
        resources_watch: kinds.iter().map(|k| (*k).to_string()).collect(),
        ..Config::default()
    }
}

/// Wait until a watcher has taken the mock feed for `kind`.
///
/// Watcher tasks subscribe only once they are first polled, so tests that
/// stop a watcher and then check its feed must wait for this first.
#[cfg(test)]
pub async fn wait_subscribed(client: &MockResourceClient, kind: &str) {
    tokio::time::timeout(WAIT, async {
        while !client.is_subscribed(kind) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}
