//! Predictive maintenance server
//!
//! Ingests multi-sensor telemetry over HTTP, stores it in SQLite and
//! serves anomaly / time-to-failure predictions for the latest reading.

use anyhow::Result;
use pdm_server::{api, build_state, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting pdm-server");

    let config = ServerConfig::load()?;
    info!(
        database = %config.database_path.display(),
        classifier = %config.classifier_path.display(),
        regressor = %config.regressor_path.display(),
        strict_parsing = config.strict_parsing,
        "Server configured"
    );

    let state = Arc::new(build_state(&config).await?);
    let logger = state.logger.clone();

    state.health_registry.set_ready(true).await;

    let addr = config.bind_addr();
    logger.log_startup(SERVER_VERSION, &addr);

    api::serve(&addr, state, shutdown_signal()).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
