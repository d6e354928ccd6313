//! ML prediction engine

mod features;
mod inference;
mod orchestrator;

pub use features::FeatureExtractor;
pub use inference::{model_fingerprint, OnnxScorer};
pub use orchestrator::{coerce_anomaly, coerce_time_to_failure, InferenceOrchestrator};

use crate::error::{PredictError, PredictResult};
use crate::models::FeatureVector;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A pre-trained scoring function.
///
/// Implementations must be immutable after construction: the same
/// instance is shared by concurrent prediction requests without locking.
pub trait Scorer: Send + Sync {
    /// Score one feature vector
    fn score(&self, features: &FeatureVector) -> Result<f64>;

    /// Human-readable model name
    fn name(&self) -> &str;

    /// Model version identifier
    fn version(&self) -> &str {
        "unversioned"
    }
}

/// The classifier/regressor pair, loaded once and shared read-only
#[derive(Clone)]
pub struct ModelSet {
    classifier: Arc<dyn Scorer>,
    regressor: Arc<dyn Scorer>,
}

impl ModelSet {
    pub fn new(classifier: Arc<dyn Scorer>, regressor: Arc<dyn Scorer>) -> Self {
        Self {
            classifier,
            regressor,
        }
    }

    /// Load both ONNX artifacts. Either one failing is a [`PredictError::ModelLoadFault`].
    pub fn load(classifier_path: impl AsRef<Path>, regressor_path: impl AsRef<Path>) -> PredictResult<Self> {
        let classifier = OnnxScorer::load("classifier", classifier_path.as_ref())
            .map_err(|e| PredictError::ModelLoadFault(format!("{e:#}")))?;
        let regressor = OnnxScorer::load("regressor", regressor_path.as_ref())
            .map_err(|e| PredictError::ModelLoadFault(format!("{e:#}")))?;

        info!(
            classifier_version = %classifier.version(),
            regressor_version = %regressor.version(),
            "Models loaded"
        );
        Ok(Self::new(Arc::new(classifier), Arc::new(regressor)))
    }

    /// Scores `classify(features) -> {0,1}`
    pub fn classifier(&self) -> &dyn Scorer {
        self.classifier.as_ref()
    }

    /// Scores `estimate_remaining_life(features) -> f64`
    pub fn regressor(&self) -> &dyn Scorer {
        self.regressor.as_ref()
    }

    /// Combined version label, e.g. `3f2a9c01b7d4+9e0d11aa5c23`
    pub fn version(&self) -> String {
        format!("{}+{}", self.classifier.version(), self.regressor.version())
    }
}
