//! Namespaced Cache server
//!
//! Serves the monitoring and cache admin API and runs the background
//! sweep, reporting and sampling tasks.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use namespaced_cache::{api::create_router, AppState, BackgroundTasks, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager and performance monitor
/// 4. Start background sweep, reporter and sampler tasks
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "namespaced_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Namespaced Cache Server");

    let started = Instant::now();
    let config = Config::from_env();
    let config_elapsed = started.elapsed();
    info!(
        "Configuration loaded: port={}, stats_interval={}s, reset_on_report={}, admin={}",
        config.server_port,
        config.stats_report_interval,
        config.stats_reset_on_report,
        config.admin_token.is_some()
    );

    let started = Instant::now();
    let state = AppState::from_config(&config);
    let monitor = state.monitor.clone();
    let cache = state.cache.clone();
    monitor.record_bootstrap("config", config_elapsed);
    monitor.record_bootstrap("cache", started.elapsed());
    info!("Cache manager initialized");

    let tasks = BackgroundTasks::spawn(&config, &cache, &monitor);

    let started = Instant::now();
    let app = create_router(state);
    monitor.record_bootstrap("router", started.elapsed());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tasks.shutdown(&cache);
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
