use crate::core::config::AppConfig;
use crate::providers::HnbProvider;
use crate::server;
use crate::store::{RateUpdater, UpdaterConfig};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Serves the API on the configured address until Ctrl-C.
pub async fn run(config: &AppConfig) -> Result<()> {
    let bind_address = config.server.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    run_with_listener(config, listener, shutdown_signal()).await
}

/// Starts the rate updater and serves the API on `listener` until `shutdown`
/// resolves, then closes the updater.
pub async fn run_with_listener<F>(
    config: &AppConfig,
    listener: TcpListener,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let provider =
        HnbProvider::from_config(&config.source).context("Failed to create HNB client")?;

    info!(
        url = %config.source.url,
        interval_secs = config.refresh_interval_secs,
        "Starting rate updater"
    );
    let updater = Arc::new(
        RateUpdater::start(
            provider,
            UpdaterConfig {
                refresh_interval: config.refresh_interval(),
            },
        )
        .await,
    );

    let app = server::updater_router(Arc::clone(&updater));
    let result = server::serve(listener, app, shutdown).await;
    updater.close();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
