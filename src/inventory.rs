//! Installed-component inventory.

use crate::config::InventoryConfig;
use crate::error::InventoryError;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Component name to version.
pub type Components = BTreeMap<String, String>;

/// Trait for inventory implementations
pub trait InventorySource: Send + Sync {
    /// Enumerate the currently installed components.
    fn components(&self) -> Result<Components, InventoryError>;
}

/// Non-recursive filename scan of a packages directory.
///
/// Every regular file whose name ends with the configured suffix is reported
/// with the same placeholder version.
#[derive(Debug, Clone)]
pub struct DirectoryInventory {
    dir: PathBuf,
    suffix: String,
    placeholder_version: String,
}

impl DirectoryInventory {
    pub fn new(
        dir: impl Into<PathBuf>,
        suffix: impl Into<String>,
        placeholder_version: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            placeholder_version: placeholder_version.into(),
        }
    }

    pub fn from_config(config: &InventoryConfig) -> Self {
        Self::new(
            config.packages_dir.clone(),
            config.package_suffix.clone(),
            config.placeholder_version.clone(),
        )
    }

    /// Collect matching entries. A bad entry is logged and skipped, never fatal.
    fn collect<I>(&self, entries: I) -> Components
    where
        I: IntoIterator<Item = std::io::Result<PathBuf>>,
    {
        let mut components = Components::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable entry in {:?}: {}", self.dir, e);
                    continue;
                }
            };
            // Follows symlinks, like a stat() of the path would.
            let is_file = std::fs::metadata(&path)
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            // Non UTF-8 names cannot be represented in the JSON report.
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if name.ends_with(&self.suffix) {
                debug!("Added component from packages directory: {}", name);
                components.insert(name.to_string(), self.placeholder_version.clone());
            }
        }
        components
    }
}

impl InventorySource for DirectoryInventory {
    fn components(&self) -> Result<Components, InventoryError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| InventoryError::Scan {
            path: self.dir.clone(),
            source,
        })?;
        Ok(self.collect(entries.map(|entry| entry.map(|entry| entry.path()))))
    }
}
