//! Predictive maintenance core library
//!
//! This crate provides:
//! - Append-only telemetry storage
//! - Permissive parsing of ingested sensor values
//! - Feature extraction and dual-model inference (anomaly + time to failure)
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod parser;
pub mod predictor;
pub mod store;

pub use error::{PredictError, PredictResult};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use parser::{ParseMode, ReadingParser};
pub use predictor::{FeatureExtractor, InferenceOrchestrator, ModelSet, OnnxScorer, Scorer};
pub use store::{SqliteStore, TelemetryStore};
