//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Kubeconfig / in-cluster configuration could not be loaded
    #[error("Client configuration error: {0}")]
    Config(String),

    /// A watch subscription could not be established
    #[error("Subscription failed for {kind}: {reason}")]
    Subscription { kind: String, reason: String },

    /// Listing a resource collection failed (used by mocks and wrappers)
    #[error("Listing {0} failed: {1}")]
    List(String, String),
}
