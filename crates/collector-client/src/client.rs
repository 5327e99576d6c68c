//! HTTP collector client
//!
//! POSTs every record as JSON to the collector endpoint, wrapped in an
//! [`Envelope`] carrying the emission time.

use crate::emitter_trait::EmitterTrait;
use crate::error::EmitterError;
use chrono::{DateTime, Utc};
use inventory::InventoryRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Wire format of one emitted record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub emitted_at: DateTime<Utc>,
    pub record: InventoryRecord,
}

/// HTTP collector client
#[derive(Debug, Clone)]
pub struct HttpEmitter {
    client: Client,
}

impl HttpEmitter {
    /// Create a new emitter
    ///
    /// # Arguments
    /// * `connect_timeout` - Upper bound for establishing a connection
    ///
    /// The request as a whole is not bounded here. Callers wrap each
    /// `emit_changes` call in their own timeout, which can change at runtime.
    pub fn new(connect_timeout: Duration) -> Result<Self, EmitterError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(EmitterError::Http)?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl EmitterTrait for HttpEmitter {
    async fn emit_changes(&self, record: &InventoryRecord, destination: &str) -> Result<(), EmitterError> {
        if !destination.starts_with("http://") && !destination.starts_with("https://") {
            return Err(EmitterError::InvalidDestination(destination.to_string()));
        }

        let envelope = Envelope {
            emitted_at: Utc::now(),
            record: record.clone(),
        };
        let body = serde_json::to_vec(&envelope)?;

        debug!("Emitting {} to {}", record.summary(), destination);

        let response = self
            .client
            .post(destination)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmitterError::Api(format!(
                "Failed to emit {}: {} - {}",
                record.summary(),
                status,
                body
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use inventory::{EventAction, Namespace, UidGenerator};
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    /// Start a throwaway collector answering every POST with `status`
    async fn start_collector(status: StatusCode) -> (String, Received) {
        start_slow_collector(status, Duration::ZERO).await
    }

    /// Like `start_collector`, answering only after `delay`
    async fn start_slow_collector(status: StatusCode, delay: Duration) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/inventory",
                post(
                    move |State(received): State<Received>, Json(body): Json<serde_json::Value>| async move {
                        received.lock().unwrap().push(body);
                        tokio::time::sleep(delay).await;
                        status
                    },
                ),
            )
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/inventory"), received)
    }

    fn namespace_record() -> InventoryRecord {
        let uids = UidGenerator::new();
        InventoryRecord::from(Namespace::new("payments", EventAction::Created, uids.new_uid()))
    }

    #[tokio::test]
    async fn test_emit_posts_envelope() {
        let (url, received) = start_collector(StatusCode::OK).await;
        let emitter = HttpEmitter::new(Duration::from_secs(5)).unwrap();

        emitter.emit_changes(&namespace_record(), &url).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["record"]["type"], "namespace");
        assert_eq!(received[0]["record"]["data"]["name"], "payments");
        assert_eq!(received[0]["record"]["data"]["event"], "created");
        assert!(received[0]["emittedAt"].is_string());
    }

    #[tokio::test]
    async fn test_emit_reports_non_success_status() {
        let (url, _received) = start_collector(StatusCode::INTERNAL_SERVER_ERROR).await;
        let emitter = HttpEmitter::new(Duration::from_secs(5)).unwrap();

        let result = emitter.emit_changes(&namespace_record(), &url).await;
        assert!(matches!(result, Err(EmitterError::Api(_))));
    }

    #[tokio::test]
    async fn test_emit_rejects_non_http_destination() {
        let emitter = HttpEmitter::new(Duration::from_secs(5)).unwrap();
        let result = emitter.emit_changes(&namespace_record(), "collector:8080").await;
        assert!(matches!(result, Err(EmitterError::InvalidDestination(_))));
    }

    #[tokio::test]
    async fn test_slow_collector_is_not_cut_off_by_connect_timeout() {
        let (url, received) = start_slow_collector(StatusCode::OK, Duration::from_millis(1500)).await;
        let emitter = HttpEmitter::new(Duration::from_secs(1)).unwrap();

        emitter.emit_changes(&namespace_record(), &url).await.unwrap();
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
