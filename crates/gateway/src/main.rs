//! Delivery Gateway
//!
//! Entry point for the delivery platform's API gateway.

use delivery_gateway::auth::JwtTokenCodec;
use delivery_gateway::config::Config;
use delivery_gateway::routes::{self, init_metrics_recorder, AppState};
use delivery_gateway::services::HttpIdentityClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delivery_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Delivery Gateway");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        users_service_address = %config.users_service_address,
        access_token_duration_seconds = config.access_token_duration.as_secs(),
        refresh_token_duration_seconds = config.refresh_token_duration.as_secs(),
        token_key_len = config.token_key_len(),
        cookie_secure = config.cookie_secure,
        "Configuration loaded successfully"
    );

    if !config.cookie_secure {
        warn!("COOKIE_SECURE is off; refresh cookies will be sent over plain HTTP");
    }

    let metrics_handle = match init_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    let codec = Arc::new(JwtTokenCodec::new(&config.token_symmetric_key));
    let identity = Arc::new(
        HttpIdentityClient::new(config.users_service_address.clone()).map_err(|e| {
            error!("Failed to create Identity Service client: {}", e);
            e
        })?,
    );

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config, codec, identity));
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Delivery Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Delivery Gateway shutdown complete");

    Ok(())
}

/// Returns when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
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
}
