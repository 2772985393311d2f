//! Status report assembly.
//!
//! A report is built fresh for every request and never cached.

use crate::config::Config;
use crate::error::{InventoryError, ReportError};
use crate::host::{Host, HostStateHandle};
use crate::inventory::{Components, DirectoryInventory, InventorySource};
use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sentinel used when the host cannot resolve its own version.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Snapshot of host metadata served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub platform_version: String,
    pub loader_type: String,
    pub components: Components,
}

/// Body of a successful status response: either a report or the degraded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusPayload {
    Report(StatusReport),
    Unavailable { error: String },
}

impl From<Result<StatusReport, ReportError>> for StatusPayload {
    fn from(result: Result<StatusReport, ReportError>) -> Self {
        match result {
            Ok(report) => StatusPayload::Report(report),
            Err(err) => StatusPayload::Unavailable {
                error: err.to_string(),
            },
        }
    }
}

impl StatusPayload {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StatusPayload::Unavailable { .. })
    }
}

/// Builds [`StatusReport`]s from the live host and an inventory source.
#[derive(Clone)]
pub struct StatusReporter {
    inventory: Arc<dyn InventorySource>,
    loader_type: String,
}

impl StatusReporter {
    pub fn new(inventory: Arc<dyn InventorySource>, loader_type: impl Into<String>) -> Self {
        Self {
            inventory,
            loader_type: loader_type.into(),
        }
    }

    /// Reporter scanning the configured packages directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(DirectoryInventory::from_config(&config.inventory)),
            config.report.loader_type.clone(),
        )
    }

    /// Build a report on the calling thread.
    pub fn build_report(&self, host: &HostStateHandle) -> Result<StatusReport, ReportError> {
        let host = host.upgrade().ok_or(ReportError::HostUnavailable)?;
        let components = degrade_inventory(self.inventory.components());
        Ok(self.assemble(host.as_ref(), components))
    }

    /// Build a report, running the inventory scan on the blocking pool.
    pub async fn build_report_async(
        &self,
        host: &HostStateHandle,
    ) -> Result<StatusReport, ReportError> {
        let host = host.upgrade().ok_or(ReportError::HostUnavailable)?;
        let inventory = self.inventory.clone();
        let scanned = tokio::task::spawn_blocking(move || inventory.components())
            .await
            .unwrap_or_else(|e| Err(InventoryError::Join(e.to_string())));
        Ok(self.assemble(host.as_ref(), degrade_inventory(scanned)))
    }

    fn assemble(&self, host: &dyn Host, components: Components) -> StatusReport {
        StatusReport {
            platform_version: host
                .platform_version()
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            loader_type: self.loader_type.clone(),
            components,
        }
    }
}

impl std::fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReporter")
            .field("loader_type", &self.loader_type)
            .finish()
    }
}

fn degrade_inventory(result: Result<Components, InventoryError>) -> Components {
    result.unwrap_or_else(|e| {
        error!("Inventory scan failed, reporting no components: {}", e);
        Components::new()
    })
}
