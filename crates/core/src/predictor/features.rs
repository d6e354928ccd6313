//! Feature extraction for ML inference
//!
//! Both models consume the same five inputs taken from a single reading.
//! The input slot called `pressure` is fed from the stored humidity value;
//! the models were trained against that name.

use crate::error::{PredictError, PredictResult};
use crate::models::{FeatureVector, SensorReading};

/// Maps a stored reading onto the model input layout
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, reading: &SensorReading) -> FeatureVector {
        FeatureVector {
            temperature: reading.temperature,
            pressure: reading.humidity,
            vibration: reading.vibration,
            voltage: reading.voltage,
            current: reading.current,
        }
    }

    /// Same as [`extract`](Self::extract) for callers holding an optional reading
    pub fn extract_from(&self, reading: Option<&SensorReading>) -> PredictResult<FeatureVector> {
        reading
            .map(|r| self.extract(r))
            .ok_or(PredictError::MissingInput)
    }
}
