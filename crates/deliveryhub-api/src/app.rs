//! Application builder: wires the hub, router and middleware into a server.

use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use deliveryhub_core::config::AppConfig;
use deliveryhub_core::result::AppResult;
use deliveryhub_realtime::RealtimeHub;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;

    info!(addr = %addr, "DeliveryHub server listening");

    serve(listener, config, shutdown_signal()).await
}

/// Runs the hub and the HTTP server on `listener` until `shutdown` resolves.
///
/// On shutdown the hub closes every connection first so open WebSockets
/// drain, then the HTTP server is given `shutdown_grace_seconds` to finish.
pub async fn serve<F>(listener: TcpListener, config: AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let (hub, hub_task) = RealtimeHub::spawn(config.realtime.clone());

    let app = build_app(AppState::new(config, hub.clone()));

    let hub_for_shutdown = hub.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown.await;
        info!("Shutdown signal received, closing realtime connections...");
        if let Err(e) = hub_for_shutdown.shutdown().await {
            warn!(error = %e, "Hub already stopped");
        }
    });

    server.await?;

    if tokio::time::timeout(grace, hub_task).await.is_err() {
        warn!("Realtime hub did not stop within the grace period");
    }

    info!("DeliveryHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
