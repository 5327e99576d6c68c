//! Liveness and readiness endpoints.
//!
//! - `GET /healthz`: always `200 ok` while the process serves requests
//! - `GET /readyz`: `200` once the initial snapshot was emitted and the
//!   watchers were started, `503` before that and after shutdown began
//! - `GET /watchers`: JSON array of kinds with a live watcher

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

#[derive(Debug, Default)]
struct ProbeStatus {
    ready: bool,
    watchers: Vec<String>,
}

/// Status shared between the controller loop and the probe server
#[derive(Debug, Clone, Default)]
pub struct ProbeState {
    inner: Arc<RwLock<ProbeStatus>>,
}

impl ProbeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).ready = ready;
    }

    pub fn is_ready(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).ready
    }

    pub fn set_watchers(&self, watchers: Vec<String>) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).watchers = watchers;
    }

    pub fn watchers(&self) -> Vec<String> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).watchers.clone()
    }
}

pub fn router(state: ProbeState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/watchers", get(watchers))
        .with_state(state)
}

/// Serve the probe endpoints on `addr` until the process exits
pub async fn serve(addr: SocketAddr, state: ProbeState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Probe server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<ProbeState>) -> (StatusCode, &'static str) {
    if state.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

async fn watchers(State(state): State<ProbeState>) -> Json<Vec<String>> {
    Json(state.watchers())
}
