//! HTTP server for the status bridge
//!
//! Exposes a single status route behind a shared API key passed as a query
//! parameter. The key is checked before anything else runs, for every path.

use crate::auth::API_KEY_PARAM;
use crate::config::HttpConfig;
use crate::error::BridgeError;
use crate::report::StatusPayload;
use crate::web::shared::BridgeState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};

/// The one supported route.
pub const STATUS_PATH: &str = "/status";

pub const UNAUTHORIZED_BODY: &str = "Unauthorized: Invalid API Key";
pub const NOT_FOUND_BODY: &str = "Not Found";

/// Build the bridge router. Methods are not distinguished.
pub fn router(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route(STATUS_PATH, any(status_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .with_state(state)
}

async fn api_key_middleware(
    State(state): State<Arc<BridgeState>>,
    req: Request<Body>,
    next: middleware::Next,
) -> Response {
    let token = first_query_value(req.uri(), API_KEY_PARAM);
    if !state.gate.authorize(token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response();
    }
    next.run(req).await
}

/// First value of `name` in the query string. An unparseable query counts as absent.
fn first_query_value(uri: &Uri, name: &str) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Status handler - always 200; callers inspect the body for degradation
async fn status_handler(State(state): State<Arc<BridgeState>>) -> Response {
    info!("Received request for status");
    let payload = StatusPayload::from(state.reporter.build_report_async(&state.host).await);
    if payload.is_degraded() {
        warn!("Status requested while no host instance is attached");
    }
    (StatusCode::OK, Json(payload)).into_response()
}

async fn not_found_handler(uri: Uri) -> Response {
    debug!("No route for {}", uri.path());
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// Accept connections until `shutdown` fires, then drain the open ones.
async fn serve(
    listener: TcpListener,
    app: Router,
    read_timeout: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        app.clone(),
                        read_timeout,
                        stop_rx.clone(),
                    ));
                }
                Err(e) => {
                    warn!("Failed to accept HTTP bridge connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    let _ = stop_tx.send(true);
    while connections.join_next().await.is_some() {}
}

/// Serve one HTTP/1.1 connection.
///
/// A client that sends nothing within `read_timeout`, or stalls mid-header, is
/// disconnected. Handlers themselves are never cut short.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: Router,
    read_timeout: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut first = [0u8; 1];
    tokio::select! {
        peeked = tokio::time::timeout(read_timeout, stream.peek(&mut first)) => match peeked {
            Ok(Ok(n)) if n > 0 => {}
            Ok(Ok(_)) => return,
            Ok(Err(e)) => {
                debug!("Read from {} failed: {}", peer, e);
                return;
            }
            Err(_) => {
                debug!("Closing idle connection from {}", peer);
                return;
            }
        },
        _ = stop.changed() => return,
    }

    let conn = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout)
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = stop.changed() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(e) = result {
        debug!("Connection from {} ended: {}", peer, e);
    }
}

/// Observable phase of a [`BridgeServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Stopped,
    Starting,
    Listening,
}

struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct ServerInner {
    phase: ServerPhase,
    running: Option<RunningServer>,
}

/// Owns the listening socket and the serve task.
///
/// `Stopped -> Starting -> Listening -> Stopped`. Start and stop are driven by
/// host lifecycle events, which never overlap.
pub struct BridgeServer {
    state: Arc<BridgeState>,
    host: String,
    read_timeout: Duration,
    inner: Mutex<ServerInner>,
}

impl BridgeServer {
    pub fn new(state: Arc<BridgeState>, http: &HttpConfig) -> Self {
        Self {
            state,
            host: http.host.clone(),
            read_timeout: Duration::from_secs(http.read_timeout_secs),
            inner: Mutex::new(ServerInner {
                phase: ServerPhase::Stopped,
                running: None,
            }),
        }
    }

    pub fn state(&self) -> &Arc<BridgeState> {
        &self.state
    }

    pub fn phase(&self) -> ServerPhase {
        self.inner.lock().phase
    }

    /// Bound address while listening. Useful when started on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().running.as_ref().map(|running| running.addr)
    }

    /// Bind `host:port` and start serving in the background.
    pub async fn start(&self, port: u16) -> Result<SocketAddr, BridgeError> {
        {
            let mut inner = self.inner.lock();
            if inner.phase != ServerPhase::Stopped {
                return Err(BridgeError::AlreadyRunning);
            }
            inner.phase = ServerPhase::Starting;
        }

        let addr = format!("{}:{}", self.host, port);
        let bound = match TcpListener::bind(&addr).await {
            Ok(listener) => listener.local_addr().map(|local| (listener, local)),
            Err(e) => Err(e),
        };
        let (listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                self.inner.lock().phase = ServerPhase::Stopped;
                error!("Couldn't bind HTTP bridge on {}: {}", addr, source);
                return Err(BridgeError::Bind { addr, source });
            }
        };

        let app = router(self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(serve(listener, app, self.read_timeout, shutdown_rx));

        let mut inner = self.inner.lock();
        inner.phase = ServerPhase::Listening;
        inner.running = Some(RunningServer {
            addr: local_addr,
            shutdown: shutdown_tx,
            task,
        });
        info!("HTTP bridge listening on http://{}", local_addr);
        Ok(local_addr)
    }

    /// Stop serving and release the socket. A no-op when already stopped.
    pub async fn stop(&self) {
        let running = {
            let mut inner = self.inner.lock();
            inner.phase = ServerPhase::Stopped;
            inner.running.take()
        };
        let Some(running) = running else {
            debug!("HTTP bridge already stopped");
            return;
        };

        let _ = running.shutdown.send(());
        if let Err(e) = running.task.await {
            warn!("HTTP bridge task ended abnormally: {}", e);
        }
        info!("HTTP bridge on {} stopped", running.addr);
    }
}

impl std::fmt::Debug for BridgeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeServer")
            .field("host", &self.host)
            .field("phase", &self.phase())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
