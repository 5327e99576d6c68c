//! Collector client errors

use thiserror::Error;

/// Errors that can occur when shipping records to the collector
#[derive(Debug, Error)]
pub enum EmitterError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector answered with a non-success status
    #[error("Collector API error: {0}")]
    Api(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Destination is not a usable URL
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
}
