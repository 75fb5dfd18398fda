//! HTTP and WebSocket front end.
//!
//! ## Endpoints
//!
//! - `GET /` service banner
//! - `GET /health` liveness plus the number of connected calls
//! - `GET /ws` one live call per connection, see [`messages`]

pub mod messages;
mod ws;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::CopilotConfig;
use crate::conversation::generator::Generator;
use crate::error::{CopilotError, Result};

const SERVICE_NAME: &str = "recruiter-copilot";

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<CopilotConfig>,
    generator: Arc<dyn Generator>,
    active_sessions: Arc<AtomicUsize>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: CopilotConfig, generator: Arc<dyn Generator>) -> Self {
        Self {
            config: Arc::new(config),
            generator,
            active_sessions: Arc::new(AtomicUsize::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CopilotConfig {
        &self.config
    }

    /// Calls currently connected.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }
}

/// Build the router without binding it.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

/// A running server task.
pub struct CopilotServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CopilotServer {
    /// Bind `bind` (port `0` picks a free port) and serve in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind.
    pub async fn start(state: AppState, bind: &str) -> Result<Self> {
        let listener = TcpListener::bind(bind)
            .await
            .map_err(|e| CopilotError::Transport(format!("bind {bind} failed: {e}")))?;
        let addr = listener.local_addr()?;
        let shutdown = state.shutdown.clone();
        let app = router(state);

        info!("copilot listening on http://{addr}");

        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!("server error: {e}");
            }
        });

        Ok(Self {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Close every connection and wait for the server task to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("copilot stopped");
    }
}

impl Drop for CopilotServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn handle_root() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "active_sessions": state.active_sessions(),
    }))
}
