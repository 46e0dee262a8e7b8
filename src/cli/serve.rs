use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::config::AppConfig;
use crate::providers::awesome_api::AwesomeApiProvider;
use crate::server::{AppState, app_router};
use crate::store::disk::DiskQuoteStore;

/// Run the quote service until interrupted. Store and provider construction
/// failures are fatal; per-request failures never are.
pub async fn run(config: &AppConfig) -> Result<()> {
    let data_path = config.data_path()?;
    let store = DiskQuoteStore::open(&data_path, config.store.insert_timeout())
        .with_context(|| format!("Failed to open quote store at {}", data_path.display()))?;

    let provider = AwesomeApiProvider::new(
        &config.provider.base_url,
        config.provider.pair.clone(),
        config.provider.timeout(),
    )
    .context("Failed to build provider HTTP client")?;

    let state = AppState {
        provider: Arc::new(provider),
        store: Arc::new(store),
        request_ceiling: config.server.request_ceiling(),
    };

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    info!(
        address = %listener.local_addr()?,
        pair = %config.provider.pair,
        "Quote service listening"
    );

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Quote service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("Failed to install ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
