//! Axum-based HTTP server exposing the published sensor state
//!
//! Read-only surface standing in for the platform's state consumers: the
//! latest snapshot, the running configuration, and a health probe.

use crate::config::Config;
use crate::driver::SensorSnapshot;
use crate::error::{RceError, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    /// Latest published snapshot
    pub snapshot_rx: watch::Receiver<Arc<SensorSnapshot>>,

    /// Running configuration
    pub config: Arc<Config>,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    let mut root = serde_json::to_value(snapshot.as_ref())
        .unwrap_or(serde_json::json!({"error": "serialization"}));
    root["version"] = serde_json::json!(env!("APP_VERSION"));
    Json(root)
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let json = serde_json::to_value(state.config.as_ref())
        .unwrap_or(serde_json::json!({"error": "serialization"}));
    Json(json)
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/config", get(get_config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server wrapper
pub struct WebServer {
    state: AppState,
}

impl WebServer {
    /// Create a new server with the given shared state
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind and serve until the process stops
    pub async fn start(self, host: &str, port: u16) -> Result<()> {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| RceError::web(format!("invalid bind address: {}", host)))?;
        let addr = SocketAddr::new(ip, port);

        let router = build_router(self.state);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RceError::web(format!("bind failed on {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| RceError::web(e.to_string()))
    }
}
