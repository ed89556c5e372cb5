//! Stampede Guard - A read-through cache service with thundering-herd protection
//!
//! Fronts a record store with a TTL cache and a lock-guarded fill path so
//! that concurrent cache misses for one record collapse into effectively a
//! single store query.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stampede_guard::api::create_router;
use stampede_guard::fetch::FetchConfig;
use stampede_guard::kv::MemoryCache;
use stampede_guard::lock::{LockConfig, MemoryLockManager};
use stampede_guard::store::MemoryStore;
use stampede_guard::{spawn_sweeper_task, AppState, Config};

/// Main entry point for the Stampede Guard server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Wire cache, lock manager, and seeded record store
/// 4. Start background cache sweeper task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stampede_guard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stampede Guard");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_ttl={}s, lock_max_hold={}ms, contended_wait={}ms, port={}",
        config.cache_ttl_secs, config.lock_max_hold_ms, config.contended_wait_ms, config.server_port
    );

    // Wire the collaborators
    let cache = Arc::new(MemoryCache::new());
    let locks = Arc::new(MemoryLockManager::new(LockConfig {
        retry_count: config.lock_retry_count,
        retry_delay: Duration::from_millis(config.lock_retry_delay_ms),
        retry_jitter: Duration::from_millis(config.lock_retry_jitter_ms),
    }));
    let store = Arc::new(MemoryStore::seeded(config.seed_records));
    info!("Record store seeded with {} records", config.seed_records);

    let state = AppState::new(
        cache.clone(),
        locks,
        store,
        FetchConfig::from_config(&config),
    );

    // Start background sweeper task
    let sweeper_handle = spawn_sweeper_task(cache, config.sweep_interval);
    info!("Background sweeper task started");

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweeper_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweeper task and allows graceful shutdown.
async fn shutdown_signal(sweeper_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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

    // Abort the sweeper task
    sweeper_handle.abort();
    warn!("Sweeper task aborted");
}
