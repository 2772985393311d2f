//! Binds the HTTP bridge to host start/stop events.
//!
//! Register [`LifecycleBinder::on_host_started`] and
//! [`LifecycleBinder::on_host_stopped`] with whatever notification mechanism the
//! host offers. The host guarantees the two never run concurrently.

use crate::auth::Credential;
use crate::config::Config;
use crate::error::BridgeError;
use crate::host::{Host, HostStateHandle};
use crate::web::{BridgeServer, BridgeState, ServerPhase};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;

pub struct LifecycleBinder {
    server: BridgeServer,
    host: HostStateHandle,
    port: u16,
}

impl LifecycleBinder {
    pub fn new(server: BridgeServer, port: u16) -> Self {
        let host = server.state().host.clone();
        Self { server, host, port }
    }

    pub fn from_config(config: &Config, credential: Credential) -> Self {
        let state = Arc::new(BridgeState::from_config(config, credential));
        Self::new(BridgeServer::new(state, &config.http), config.http.port)
    }

    /// Publish the host and start serving.
    ///
    /// A bind failure is logged and returned; the host keeps running without the bridge.
    pub async fn on_host_started(&self, host: Arc<dyn Host>) -> Result<SocketAddr, BridgeError> {
        self.host.attach(&host);
        info!("Host instance acquired for HTTP bridge");

        match self.server.start(self.port).await {
            Ok(addr) => {
                info!("HTTP bridge started on {}", addr);
                Ok(addr)
            }
            Err(e) => {
                error!("Couldn't start HTTP bridge, continuing without it: {}", e);
                Err(e)
            }
        }
    }

    /// Stop serving and withdraw the host.
    pub async fn on_host_stopped(&self) {
        self.server.stop().await;
        self.host.detach();
        info!("HTTP bridge stopped. Restart the host to resume access.");
    }

    pub fn server(&self) -> &BridgeServer {
        &self.server
    }

    pub fn host_handle(&self) -> &HostStateHandle {
        &self.host
    }

    pub fn is_serving(&self) -> bool {
        self.server.phase() == ServerPhase::Listening
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;
    use crate::inventory::test_support::package_dir;
    use crate::report::StatusReporter;
    use tempfile::TempDir;

    fn binder(dir: &TempDir, port: u16) -> LifecycleBinder {
        let mut config = Config::default();
        config.http.host = "127.0.0.1".into();
        config.http.port = port;
        config.inventory.packages_dir = dir.path().to_path_buf();
        LifecycleBinder::from_config(&config, Credential::new("key").unwrap())
    }

    fn host() -> Arc<dyn Host> {
        Arc::new(StaticHost::new(Some("1.20.1".into())))
    }

    #[tokio::test]
    async fn start_attaches_host_and_serves() {
        let dir = package_dir(&["alpha.jar"]);
        let binder = binder(&dir, 0);
        let host = host();

        binder.on_host_started(host.clone()).await.unwrap();
        assert!(binder.is_serving());
        assert!(binder.host_handle().is_attached());

        let reporter: &StatusReporter = &binder.server().state().reporter;
        let report = reporter.build_report(binder.host_handle()).unwrap();
        assert_eq!(report.components.len(), 1);

        binder.on_host_stopped().await;
        assert!(!binder.is_serving());
        assert!(!binder.host_handle().is_attached());
        assert!(binder.server().local_addr().is_none());
    }

    #[tokio::test]
    async fn bind_failure_is_not_fatal() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let dir = package_dir(&[]);
        let binder = binder(&dir, port);
        let host = host();

        let result = binder.on_host_started(host.clone()).await;
        assert!(matches!(result, Err(BridgeError::Bind { .. })));
        assert!(!binder.is_serving());
        // Host is still published even though the bridge is down.
        assert!(binder.host_handle().is_attached());

        binder.on_host_stopped().await;
        assert!(!binder.host_handle().is_attached());
    }

    #[tokio::test]
    async fn stop_before_start_is_harmless() {
        let dir = package_dir(&[]);
        let binder = binder(&dir, 0);
        binder.on_host_stopped().await;
        binder.on_host_stopped().await;
        assert!(!binder.is_serving());
    }
}
