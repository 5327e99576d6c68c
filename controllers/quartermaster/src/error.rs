//! Controller-specific error types.
//!
//! Watchers and the snapshot builder never return errors, they log them. The
//! variants here cover startup: configuration, client construction and the
//! probes listener.

use cluster_client::ClusterError;
use collector_client::EmitterError;
use thiserror::Error;

/// Errors that can occur in the Quartermaster Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client error
    #[error("Cluster client error: {0}")]
    Cluster(#[from] ClusterError),

    /// Collector client error
    #[error("Collector client error: {0}")]
    Emitter(#[from] EmitterError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] serde_yaml::Error),

    /// I/O error (configuration file, probes listener)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
