//! Blankly relay server
//!
//! WebSocket room relay for scene edits plus the share-code API. Nothing is
//! persisted: rooms and codes live for the lifetime of the process.

pub mod config;
pub mod relay;
pub mod share;

use axum::{
    Router,
    http::HeaderValue,
    routing::get,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use relay::Relay;
use share::ShareStore;

/// Shared application state
pub struct AppState {
    pub relay: Relay,
    pub shares: ShareStore,
}

impl AppState {
    pub fn new(share_ttl: Duration) -> Self {
        Self {
            relay: Relay::new(),
            shares: ShareStore::new(share_ttl),
        }
    }
}

/// Build the router. `cors_origin` restricts cross-origin access to one
/// origin; `None` allows any.
pub fn app(state: Arc<AppState>, cors_origin: Option<&str>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(relay::ws_handler))
        .route("/api/share", get(share::redeem).post(share::issue))
        .route("/health", get(health))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Ignoring unusable CORS origin {:?}: {}", origin, e);
            CorsLayer::permissive()
        }
    }
}

/// Index page
async fn index() -> &'static str {
    "Blankly Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}
