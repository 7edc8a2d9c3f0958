use blankly_server::{AppState, app, config::ServerConfig};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

const PURGE_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blankly_server=info,tower_http=info".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(config.share_ttl));

    let purge_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = purge_state.shares.purge_expired(std::time::Instant::now());
            if purged > 0 {
                info!("Purged {} expired share codes", purged);
            }
        }
    });

    let app = app(state, config.cors_origin.as_deref());

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind, e);
            std::process::exit(1);
        }
    };
    info!("Blankly relay server listening on {}", config.bind);
    info!("WebSocket endpoint: ws://{}/ws", config.bind);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
