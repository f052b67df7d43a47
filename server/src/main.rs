//! Ticketmarket server binary.

use std::sync::Arc;
use ticketmarket_server::{build_router, AppState, Config};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment.
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticketmarket_server=info,ticketmarket_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ticketmarket server");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        intent_ttl = config.registry.intent_ttl,
        portal = %config.portal.base_url,
        mint_endpoint = config.minter.endpoint.as_deref().unwrap_or("disabled"),
        "Configuration loaded"
    );

    ticketmarket_core::metrics::register_business_metrics();

    let state = AppState::from_config(&config)?;

    // Garbage-collect abandoned payment intents on an interval.
    spawn_intent_sweeper(
        Arc::clone(&state.registry),
        config.registry.intent_ttl,
        config.registry.sweep_interval,
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Spawn the background task that expires abandoned payment intents.
fn spawn_intent_sweeper(
    registry: Arc<ticketmarket_core::PaymentReferenceRegistry>,
    ttl_seconds: u64,
    interval_seconds: u64,
) {
    tokio::spawn(async move {
        let ttl = chrono::Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(1800));
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_seconds.max(1)));
        info!(
            ttl_seconds,
            interval_seconds, "Payment intent sweeper started"
        );
        loop {
            interval.tick().await;
            if let Err(error) = registry.purge_expired(ttl).await {
                tracing::error!(%error, "Intent expiry sweep failed");
            }
        }
    });
}

/// Graceful shutdown signal handler: Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => tracing::error!(%error, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
