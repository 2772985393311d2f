//! hostbridge - standalone runner
//!
//! Stands in for an embedding host: raises "host started" once configuration is
//! loaded and "host stopped" on Ctrl-C.

mod args;

use args::Args;
use clap::Parser;
use hostbridge_core::{Config, Credential, Host, LifecycleBinder, StaticHost};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();
    let loaded = args.load_config();

    // Initialize logging; HOSTBRIDGE_LOG wins over --verbose and the config file
    let log_level = match (&loaded, args.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(cfg), false) => cfg.logging.level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    env_logger::Builder::new()
        .parse_filters(&std::env::var("HOSTBRIDGE_LOG").unwrap_or(log_level))
        .filter_module("hyper", log::LevelFilter::Warn)
        .init();

    info!("hostbridge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match loaded {
        Ok(cfg) => {
            info!("Loaded configuration from {:?}", args.config);
            cfg
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    };
    config.apply_env_overrides();
    args.apply_overrides(&mut config);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    let credential = match Credential::from_config(&config.auth) {
        Ok(credential) => credential,
        Err(e) => {
            error!("Refusing to start without an API key: {}", e);
            return Err(e.into());
        }
    };

    let binder = LifecycleBinder::from_config(&config, credential);
    let host: Arc<dyn Host> = Arc::new(StaticHost::new(args.platform_version.clone()));

    if binder.on_host_started(host.clone()).await.is_err() {
        warn!("Running without the HTTP bridge");
    }

    // Wait for shutdown signal
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");

    binder.on_host_stopped().await;
    drop(host);

    info!("hostbridge exited");
    Ok(())
}
