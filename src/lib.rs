//! hostbridge - embedded HTTP status bridge
//!
//! Runs inside a long-lived host process and reports host metadata to a
//! caller holding the shared API key.

pub mod config;
pub mod error;
pub mod auth;
pub mod host;
pub mod inventory;
pub mod report;
pub mod web;
pub mod lifecycle;

// Re-exports
pub use auth::{Credential, CredentialGate};
pub use config::Config;
pub use error::{BridgeError, ConfigError, InventoryError, ReportError};
pub use host::{Host, HostStateHandle, StaticHost};
pub use inventory::{DirectoryInventory, InventorySource};
pub use lifecycle::LifecycleBinder;
pub use report::{StatusPayload, StatusReport, StatusReporter};
pub use web::{BridgeServer, BridgeState, ServerPhase};
