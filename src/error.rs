//! Error types for the bridge.
//!
//! Unauthorized requests are not represented here: the credential gate answers
//! with a plain `bool` and the HTTP layer renders the 401.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while starting the HTTP bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The listening socket could not be acquired.
    #[error("failed to bind HTTP bridge on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP bridge is already running")]
    AlreadyRunning,
}

/// Failures while assembling a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    /// No live host is attached (not yet started, or already stopped).
    #[error("Server instance not available")]
    HostUnavailable,
}

/// Failures while enumerating installed components.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("error accessing packages directory {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inventory scan task failed: {0}")]
    Join(String),
}

/// Failures while loading process-start configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no API key configured (set ${env} or auth.api_key_file)")]
    MissingCredential { env: String },
}
