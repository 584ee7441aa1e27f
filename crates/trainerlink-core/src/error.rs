//! Error types for the collaborators around the session core.
//!
//! The reducer and the generator have no error paths. Everything that can fail
//! lives at the edges: finding devices, binding them, loading configuration,
//! and talking to the session task.

use std::path::PathBuf;

use thiserror::Error;

/// Device enumeration failed.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("device discovery unavailable: {0}")]
    Unavailable(String),
}

/// Binding a device to a role failed. The role stays unbound.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {address}: {reason}")]
    Failed { address: String, reason: String },

    #[error("no device with address {0}")]
    UnknownDevice(String),
}

impl ConnectionError {
    pub fn failed(address: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Failed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}

/// Training cannot start with the current bindings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no trainer bound; bind a trainer before starting training")]
    NoTrainer,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// The session task is gone.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session runtime has shut down")]
    Closed,

    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
