//! Token Gateway
//!
//! Issues LiveKit access tokens for drone video rooms: viewer tokens on
//! demand, publisher tokens subject to a one-publisher-per-room check.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use token_gateway::config::Config;
use token_gateway::observability::metrics::init_metrics_recorder;
use token_gateway::routes::{self, AppState};
use token_gateway::services::{LiveKitRoomClient, LiveKitSigner};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal in deployed environments
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(dotenv_loaded, "Starting Token Gateway");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        server_url = %config.server_url,
        bind_address = %config.bind_address,
        devices = ?config.devices,
        upstream_timeout_seconds = config.upstream_timeout.as_secs(),
        token_ttl_seconds = config.token_ttl.as_secs(),
        drain_seconds = config.drain_period.as_secs(),
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    // Upstream room service client, authenticated with the same key pair
    let upstream_url = config.upstream_http_url();
    let room_client = LiveKitRoomClient::new(
        upstream_url.clone(),
        Arc::new(LiveKitSigner::from_config(&config)),
        config.upstream_timeout,
    )
    .map_err(|e| {
        error!("Failed to create upstream room client: {}", e);
        e
    })?;

    info!(upstream_url = %upstream_url, "Upstream room client initialized");

    let bind_address = config.bind_address.clone();
    let drain_period = config.drain_period;
    let state = Arc::new(AppState::new(config, Arc::new(room_client)));
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Token Gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(drain_period))
        .await?;

    info!("Token Gateway shutdown complete");

    Ok(())
}

/// Resolves on SIGINT/SIGTERM once the optional drain period has elapsed.
async fn shutdown_signal(drain_period: Duration) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    // Requests are short-lived; no drain unless asked for
    if !drain_period.is_zero() {
        warn!("Draining connections for {} seconds...", drain_period.as_secs());
        tokio::time::sleep(drain_period).await;
        info!("Drain period complete");
    }
}
