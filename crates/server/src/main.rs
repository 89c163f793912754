//! doctree server entry point.
//!
//! Boots the HTTP document service: loads configuration, opens the store,
//! starts the cache sweeper and serves until Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::Result;
use doctree_core::{AppConfig, DocumentCache, DocumentStore};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod error;
mod handlers;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = AppConfig::load()?;
    let addr = config.socket_addr()?;

    let store = DocumentStore::open(&config.db_path).await?;
    store.ping().await?;
    store.seed_if_empty(config.seed_documents).await?;

    let cache = Arc::new(DocumentCache::new(config.cache_live_time()));
    let sweeper = cache.spawn_sweeper(config.cache_sweep_interval());

    let state = AppState::new(store, cache)
        .with_list_processing(config.list_max_concurrency, &config.list_title_suffix);
    let app = routes::router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, live_time_secs = config.cache_live_time_secs, "Starting doctree server");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    sweeper.abort();
    tracing::info!("doctree server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
