//! HTTP bridge
//!
//! Serves the authenticated status endpoint.

pub mod shared;
pub use shared::BridgeState;

pub mod http_server;
pub use http_server::{router, BridgeServer, ServerPhase, STATUS_PATH};
