//! Error types for network construction, configuration and planning.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the network model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("invalid network: {0}")]
    InvalidNetwork(String),
}

/// Per-request failures reported back to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("waste quantity {quantity} kg exceeds vehicle capacity {capacity} kg")]
    CapacityExceeded { quantity: f64, capacity: f64 },
    #[error("no route from `{origin}` to `{target}`")]
    NoRouteFound { origin: String, target: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failures while loading [`crate::config::Settings`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
}
