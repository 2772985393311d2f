//! The embedding host process and the weak handle request handlers read it through.
//!
//! The host owns its own lifetime. The bridge only keeps a [`Weak`] reference,
//! published at "host started" and withdrawn at "host stopped".

use arc_swap::ArcSwapOption;
use std::sync::{Arc, Weak};

/// Facilities the host process exposes to the bridge.
pub trait Host: Send + Sync {
    /// Version string reported by the host's own version facility, if it can resolve one.
    fn platform_version(&self) -> Option<String>;
}

/// Single-slot, lock-free reference to the running host.
///
/// Cloning yields another view of the same slot.
#[derive(Clone, Default)]
pub struct HostStateHandle {
    slot: Arc<ArcSwapOption<Weak<dyn Host>>>,
}

impl HostStateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the running host. Only the lifecycle binder calls this.
    pub(crate) fn attach(&self, host: &Arc<dyn Host>) {
        self.slot.store(Some(Arc::new(Arc::downgrade(host))));
    }

    /// Withdraw the host. Only the lifecycle binder calls this.
    pub(crate) fn detach(&self) {
        self.slot.store(None);
    }

    /// The live host, or `None` if detached or already dropped by its owner.
    pub fn upgrade(&self) -> Option<Arc<dyn Host>> {
        self.slot.load_full().and_then(|weak| weak.upgrade())
    }

    pub fn is_attached(&self) -> bool {
        self.upgrade().is_some()
    }
}

impl std::fmt::Debug for HostStateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostStateHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A host with a fixed version string.
#[derive(Debug, Clone)]
pub struct StaticHost {
    version: Option<String>,
}

impl StaticHost {
    pub fn new(version: Option<String>) -> Self {
        Self { version }
    }
}

impl Host for StaticHost {
    fn platform_version(&self) -> Option<String> {
        self.version.clone()
    }
}
