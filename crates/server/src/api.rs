//! HTTP API: ingestion, history, prediction, health and Prometheus metrics

use crate::error::ApiError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pdm_core::{
    health::{components, ComponentStatus, HealthRegistry},
    store::DEFAULT_HISTORY_LIMIT,
    InferenceOrchestrator, PredictError, PredictResult, PredictionResult, RawReading,
    ReadingParser, SensorReading, ServiceMetrics, StructuredLogger, TelemetryStore,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// Body returned when a reading was stored
pub const INGEST_OK: &str = "Sensor values stored successfully";

/// Body returned when the store rejected a reading
pub const INGEST_FAILED: &str = "Invalid input or database error";

/// Prediction capability, fixed at startup
pub enum PredictorSlot {
    Ready(InferenceOrchestrator),
    /// Models failed to load; holds the [`PredictError::ModelLoadFault`]
    Unavailable(PredictError),
}

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn TelemetryStore>,
    pub predictor: PredictorSlot,
    pub parser: ReadingParser,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub history_max_limit: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        predictor: PredictorSlot,
        health_registry: HealthRegistry,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            store,
            predictor,
            parser: ReadingParser::permissive(),
            health_registry,
            metrics: ServiceMetrics::new(),
            logger,
            history_max_limit: 1000,
        }
    }

    pub fn with_parser(mut self, parser: ReadingParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_history_max_limit(mut self, limit: usize) -> Self {
        self.history_max_limit = limit;
        self
    }

    /// Reflect the outcome of a storage access in the `store` component
    async fn track_store<T>(&self, result: &PredictResult<T>) {
        match result {
            Err(PredictError::StorageFault(message)) => {
                self.health_registry
                    .set_unhealthy(components::STORE, message.clone())
                    .await
            }
            _ => self.health_registry.set_healthy(components::STORE).await,
        }
    }
}

/// Query parameters in request order
type QueryPairs = Vec<(String, String)>;

/// First value for `name`; later repeats are ignored
fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn raw_reading(params: &[(String, String)]) -> RawReading {
    let field = |name: &str| first_param(params, name).map(str::to_string);
    RawReading {
        temperature: field("temperature"),
        humidity: field("humidity"),
        vibration: field("vibration"),
        current: field("current"),
        voltage: field("voltage"),
    }
}

/// Store one reading from query parameters
async fn ingest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryPairs>,
) -> Response {
    let fields = match state.parser.parse(&raw_reading(&params)) {
        Ok(fields) => fields,
        Err(err) => {
            state.metrics.inc_ingest_errors();
            warn!(error = %err, "Rejected sensor values");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let result = state.store.insert(fields).await;
    state.track_store(&result).await;

    match result {
        Ok(reading) => {
            state.metrics.inc_readings_ingested();
            state.logger.log_reading_ingested(reading.id);
            (StatusCode::OK, INGEST_OK).into_response()
        }
        Err(err) => {
            state.metrics.inc_ingest_errors();
            error!(error = %err, "Error storing sensor data");
            (StatusCode::INTERNAL_SERVER_ERROR, INGEST_FAILED).into_response()
        }
    }
}

/// Most recent readings, newest first
async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<Vec<SensorReading>>, ApiError> {
    let limit = first_param(&params, "limit")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(state.history_max_limit);

    let result = state.store.query_recent(limit).await;
    state.track_store(&result).await;
    Ok(Json(result?))
}

/// Every reading, oldest first
async fn series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SensorReading>>, ApiError> {
    let result = state.store.query_all_ordered().await;
    state.track_store(&result).await;
    Ok(Json(result?))
}

/// Anomaly flag and time to failure for the latest reading
async fn predict(State(state): State<Arc<AppState>>) -> Result<Json<PredictionResult>, ApiError> {
    match &state.predictor {
        PredictorSlot::Ready(orchestrator) => {
            // Every outcome other than a storage fault means the read succeeded
            let result = orchestrator.predict_latest().await;
            state.track_store(&result).await;
            Ok(Json(result?))
        }
        PredictorSlot::Unavailable(err) => Err(err.clone().into()),
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sensor", get(ingest).post(ingest))
        .route("/history", get(history))
        .route("/series", get(series))
        .route("/predict", get(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
