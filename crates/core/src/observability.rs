//! Observability infrastructure for the predictive maintenance service
//!
//! Provides:
//! - Prometheus metrics (ingestion counts, prediction latency, anomalies, model version)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    readings_ingested: IntCounter,
    ingest_errors: IntCounter,
    prediction_latency_seconds: Histogram,
    predictions_generated: IntCounter,
    anomalies_detected: IntCounter,
    prediction_errors: IntCounter,
    model_version_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            readings_ingested: register_int_counter!(
                "pdm_readings_ingested_total",
                "Total number of sensor readings stored"
            )
            .expect("Failed to register readings_ingested"),

            ingest_errors: register_int_counter!(
                "pdm_ingest_errors_total",
                "Total number of rejected or failed ingestion requests"
            )
            .expect("Failed to register ingest_errors"),

            prediction_latency_seconds: register_histogram!(
                "pdm_prediction_latency_seconds",
                "Time spent reading the latest sample and running both models",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_generated: register_int_counter!(
                "pdm_predictions_generated_total",
                "Total number of predictions generated"
            )
            .expect("Failed to register predictions_generated"),

            anomalies_detected: register_int_counter!(
                "pdm_anomalies_detected_total",
                "Total number of predictions flagged as anomalous"
            )
            .expect("Failed to register anomalies_detected"),

            prediction_errors: register_int_counter!(
                "pdm_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors"),

            model_version_info: register_gauge_vec!(
                "pdm_model_version_info",
                "Information about the currently loaded models",
                &["model", "version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn inc_readings_ingested(&self) {
        self.inner().readings_ingested.inc();
    }

    pub fn inc_ingest_errors(&self) {
        self.inner().ingest_errors.inc();
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_generated(&self) {
        self.inner().predictions_generated.inc();
    }

    pub fn inc_anomalies_detected(&self) {
        self.inner().anomalies_detected.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    /// Record the version of a loaded model
    pub fn set_model_version(&self, model: &str, version: &str) {
        self.inner()
            .model_version_info
            .with_label_values(&[model, version])
            .set(1.0);
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for ingestion, predictions
/// and model lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn log_reading_ingested(&self, id: i64) {
        info!(
            event = "reading_ingested",
            service = %self.service,
            reading_id = id,
            "Sensor values stored"
        );
    }

    pub fn log_prediction(&self, reading_id: i64, anomaly: u8, time_to_failure: f64, model_version: &str) {
        if anomaly == 1 {
            warn!(
                event = "prediction_generated",
                service = %self.service,
                reading_id = reading_id,
                anomaly = anomaly,
                time_to_failure = time_to_failure,
                model_version = %model_version,
                "Anomaly predicted"
            );
        } else {
            info!(
                event = "prediction_generated",
                service = %self.service,
                reading_id = reading_id,
                anomaly = anomaly,
                time_to_failure = time_to_failure,
                model_version = %model_version,
                "Generated prediction"
            );
        }
    }

    pub fn log_prediction_failure(&self, code: &str, details: &str) {
        error!(
            event = "prediction_failed",
            service = %self.service,
            code = %code,
            details = %details,
            "Prediction failed"
        );
    }

    pub fn log_model_loaded(&self, version: &str) {
        info!(
            event = "model_loaded",
            service = %self.service,
            model_version = %version,
            "Models loaded"
        );
    }

    pub fn log_model_load_failed(&self, details: &str) {
        error!(
            event = "model_load_failed",
            service = %self.service,
            details = %details,
            "Models unavailable, predictions disabled"
        );
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            addr = %addr,
            "Predictive maintenance service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Predictive maintenance service shutting down"
        );
    }
}
