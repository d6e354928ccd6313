//! Prediction on the most recent reading
//!
//! One call reads the latest stored sample, extracts a single feature
//! vector and runs the classifier and then the regressor against that same
//! vector. Scorer errors and panics are contained in the call.

use super::{FeatureExtractor, ModelSet};
use crate::error::{PredictError, PredictResult};
use crate::models::{FeatureVector, PredictionResult};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::store::TelemetryStore;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs the dual-model prediction pipeline
pub struct InferenceOrchestrator {
    store: Arc<dyn TelemetryStore>,
    models: ModelSet,
    extractor: FeatureExtractor,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl InferenceOrchestrator {
    pub fn new(store: Arc<dyn TelemetryStore>, models: ModelSet) -> Self {
        Self {
            store,
            models,
            extractor: FeatureExtractor::new(),
            metrics: ServiceMetrics::new(),
            logger: StructuredLogger::new("pdm"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Predict anomaly and time to failure for the latest stored reading
    pub async fn predict_latest(&self) -> PredictResult<PredictionResult> {
        let start = Instant::now();
        let outcome = self.run().await;

        match &outcome {
            Ok((reading_id, prediction)) => {
                self.metrics
                    .observe_prediction_latency(start.elapsed().as_secs_f64());
                self.metrics.inc_predictions_generated();
                if prediction.is_anomaly() {
                    self.metrics.inc_anomalies_detected();
                }
                self.logger.log_prediction(
                    *reading_id,
                    prediction.anomaly,
                    prediction.time_to_failure,
                    &self.models.version(),
                );
            }
            Err(PredictError::NoDataAvailable) => {
                debug!("Prediction requested before any reading was stored");
            }
            Err(err) => {
                self.metrics.inc_prediction_errors();
                self.logger
                    .log_prediction_failure(err.code(), &err.to_string());
            }
        }

        outcome.map(|(_, prediction)| prediction)
    }

    async fn run(&self) -> PredictResult<(i64, PredictionResult)> {
        let reading = self
            .store
            .latest()
            .await?
            .ok_or(PredictError::NoDataAvailable)?;
        let features = self.extractor.extract(&reading);

        let models = self.models.clone();
        let prediction = tokio::task::spawn_blocking(move || score_both(&models, &features))
            .await
            .map_err(|err| {
                let reason = if err.is_panic() {
                    panic_message(err.into_panic())
                } else {
                    "scoring task cancelled".to_string()
                };
                PredictError::InferenceFailure(reason)
            })??;

        Ok((reading.id, prediction))
    }
}

/// Classifier first; the regressor only runs if the classifier succeeded
fn score_both(models: &ModelSet, features: &FeatureVector) -> PredictResult<PredictionResult> {
    let raw_class = models
        .classifier()
        .score(features)
        .map_err(PredictError::inference)?;
    let anomaly = coerce_anomaly(raw_class)?;

    let raw_life = models
        .regressor()
        .score(features)
        .map_err(PredictError::inference)?;
    let time_to_failure = coerce_time_to_failure(raw_life)?;

    Ok(PredictionResult {
        anomaly,
        time_to_failure,
    })
}

/// Truncate a classifier score toward zero; only 0 and 1 are valid labels
pub fn coerce_anomaly(raw: f64) -> PredictResult<u8> {
    if !raw.is_finite() {
        return Err(PredictError::InferenceFailure(format!(
            "classifier returned non-finite score {raw}"
        )));
    }
    match raw.trunc() {
        t if t == 0.0 => Ok(0),
        t if t == 1.0 => Ok(1),
        _ => Err(PredictError::InferenceFailure(format!(
            "classifier returned {raw}, expected label 0 or 1"
        ))),
    }
}

pub fn coerce_time_to_failure(raw: f64) -> PredictResult<f64> {
    if raw.is_finite() {
        Ok(raw)
    } else {
        Err(PredictError::InferenceFailure(format!(
            "regressor returned non-finite estimate {raw}"
        )))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("scoring function panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_anomaly_labels() {
        assert_eq!(coerce_anomaly(0.0), Ok(0));
        assert_eq!(coerce_anomaly(1.0), Ok(1));
        assert_eq!(coerce_anomaly(0.9), Ok(0));
        assert_eq!(coerce_anomaly(1.7), Ok(1));
        assert_eq!(coerce_anomaly(-0.4), Ok(0));
    }

    #[test]
    fn test_coerce_anomaly_rejects_other_values() {
        assert!(matches!(
            coerce_anomaly(2.0),
            Err(PredictError::InferenceFailure(_))
        ));
        assert!(matches!(
            coerce_anomaly(-1.0),
            Err(PredictError::InferenceFailure(_))
        ));
        assert!(matches!(
            coerce_anomaly(f64::NAN),
            Err(PredictError::InferenceFailure(_))
        ));
    }

    #[test]
    fn test_coerce_time_to_failure() {
        assert_eq!(coerce_time_to_failure(94.0), Ok(94.0));
        assert_eq!(coerce_time_to_failure(-3.5), Ok(-3.5));
        assert!(coerce_time_to_failure(f64::INFINITY).is_err());
    }

    #[test]
    fn test_panic_message_extracts_payload() {
        let payload: Box<dyn Any + Send> = Box::new("weights corrupted");
        assert_eq!(
            panic_message(payload),
            "scoring function panicked: weights corrupted"
        );
        let payload: Box<dyn Any + Send> = Box::new(String::from("bad shape"));
        assert_eq!(panic_message(payload), "scoring function panicked: bad shape");
    }
}
