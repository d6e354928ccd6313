//! Predictive maintenance HTTP service
//!
//! Wires the telemetry store and the pre-trained models into the API.
//! Both are constructed once here and injected into the handlers.

pub mod api;
pub mod config;
pub mod error;

use anyhow::{Context, Result};
use crate::api::{AppState, PredictorSlot};
use crate::config::ServerConfig;
use pdm_core::{
    health::{components, HealthRegistry},
    InferenceOrchestrator, ModelSet, ReadingParser, ServiceMetrics, SqliteStore, StructuredLogger,
    TelemetryStore,
};
use std::sync::Arc;
use tracing::info;

/// Open the store, load the models and assemble shared state.
///
/// A store that cannot be opened is fatal. Models that fail to load only
/// disable prediction: ingestion and history keep working.
pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let logger = StructuredLogger::new(&config.service_name);
    let metrics = ServiceMetrics::new();

    let health_registry = HealthRegistry::new();
    health_registry.register(components::STORE).await;
    health_registry.register(components::PREDICTOR).await;

    let store: Arc<dyn TelemetryStore> = Arc::new(
        SqliteStore::open(&config.database_path).context("Failed to open telemetry store")?,
    );
    let stored = store.count().await?;
    info!(readings = stored, "Telemetry store ready");

    let predictor = match ModelSet::load(&config.classifier_path, &config.regressor_path) {
        Ok(models) => {
            metrics.set_model_version("classifier", models.classifier().version());
            metrics.set_model_version("regressor", models.regressor().version());
            logger.log_model_loaded(&models.version());
            PredictorSlot::Ready(
                InferenceOrchestrator::new(Arc::clone(&store), models).with_logger(logger.clone()),
            )
        }
        Err(err) => {
            logger.log_model_load_failed(&err.to_string());
            health_registry
                .set_unhealthy(components::PREDICTOR, err.to_string())
                .await;
            PredictorSlot::Unavailable(err)
        }
    };

    Ok(AppState::new(store, predictor, health_registry, logger)
        .with_parser(ReadingParser::new(config.parse_mode()))
        .with_history_max_limit(config.effective_history_max()))
}
