//! Quartermaster Controller
//!
//! Keeps an external inventory collector informed about what runs in a
//! Kubernetes cluster:
//! - at startup, one full snapshot (namespaces, deployments, pods, cluster
//!   name and version) is emitted
//! - afterwards, one watcher per configured kind emits a fact for every
//!   created, deleted or (for pods) modified object
//!
//! Watched kinds can be changed at runtime through the configuration file.

mod config;
mod context;
mod controller;
mod error;
mod facts;
mod lifecycle;
mod probes;
mod snapshot;
mod watcher;

#[cfg(test)]
mod lifecycle_test;
#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::controller::Controller;
use crate::probes::ProbeState;
use anyhow::Context as _;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // kube and reqwest both pull in rustls; pick the provider explicitly
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        info!("rustls crypto provider already installed");
    }

    info!("Starting Quartermaster Controller");

    let config = Config::from_env().context("failed to load configuration")?;

    info!("Configuration:");
    info!("  Remote endpoint: {}", config.remote_endpoint);
    info!("  Watching: {}", config.resources_watch.join(", "));
    info!("  Emit timeout: {:?}", config.emit_timeout);
    info!("  Probe address: {}", config.probe_addr);
    match &config.config_file {
        Some(path) => info!("  Config file: {} (polled every {:?})", path.display(), config.config_poll_interval),
        None => info!("  Config file: none"),
    }

    let probes = ProbeState::new();
    let probe_addr = config.probe_addr;
    let probe_state = probes.clone();
    tokio::spawn(async move {
        if let Err(e) = crate::probes::serve(probe_addr, probe_state).await {
            error!("Probe server failed: {}", e);
        }
    });

    let controller = Controller::connect(config, probes)
        .await
        .context("failed to initialize controller")?;
    controller.run(shutdown_signal()).await;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
