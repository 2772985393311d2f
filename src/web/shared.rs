//! Shared state for hostbridge request handlers
//!
//! Handlers only read from this state. The host handle inside is swapped by
//! the lifecycle binder.

use crate::auth::{Credential, CredentialGate};
use crate::config::Config;
use crate::host::HostStateHandle;
use crate::report::StatusReporter;

/// Shared state for the HTTP bridge
#[derive(Debug, Clone)]
pub struct BridgeState {
    /// Credential gate run before any other per-request work
    pub gate: CredentialGate,

    /// Status report builder
    pub reporter: StatusReporter,

    /// Current host, if any
    pub host: HostStateHandle,
}

impl BridgeState {
    pub fn new(gate: CredentialGate, reporter: StatusReporter, host: HostStateHandle) -> Self {
        Self {
            gate,
            reporter,
            host,
        }
    }

    /// State scanning the configured packages directory, with no host attached yet.
    pub fn from_config(config: &Config, credential: Credential) -> Self {
        Self::new(
            CredentialGate::new(credential),
            StatusReporter::from_config(config),
            HostStateHandle::new(),
        )
    }
}
