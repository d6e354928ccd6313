//! Core data models for the predictive maintenance pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names of the model input slots, in the order both models were trained on
pub const FEATURE_NAMES: [&str; 5] = ["temperature", "pressure", "vibration", "voltage", "current"];

/// Number of input features expected by both models
pub const NUM_FEATURES: usize = FEATURE_NAMES.len();

/// One stored telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub vibration: f64,
    pub current: f64,
    pub voltage: f64,
    pub timestamp: DateTime<Utc>,
}

/// Sensor values of a reading before the store assigns `id` and `timestamp`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingFields {
    pub temperature: f64,
    pub humidity: f64,
    pub vibration: f64,
    pub current: f64,
    pub voltage: f64,
}

impl ReadingFields {
    /// Attach store-assigned identity to these values
    pub fn into_reading(self, id: i64, timestamp: DateTime<Utc>) -> SensorReading {
        SensorReading {
            id,
            temperature: self.temperature,
            humidity: self.humidity,
            vibration: self.vibration,
            current: self.current,
            voltage: self.voltage,
            timestamp,
        }
    }
}

/// Raw ingestion parameters as received from the transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub vibration: Option<String>,
    pub current: Option<String>,
    pub voltage: Option<String>,
}

/// Model input derived from a single reading.
///
/// `pressure` carries the reading's humidity value: the models were trained
/// with that slot name and the mapping must stay as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub temperature: f64,
    pub pressure: f64,
    pub vibration: f64,
    pub voltage: f64,
    pub current: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.temperature,
            self.pressure,
            self.vibration,
            self.voltage,
            self.current,
        ]
    }
}

/// Combined output of the classifier and the regressor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub anomaly: u8,
    pub time_to_failure: f64,
}

impl PredictionResult {
    pub fn is_anomaly(&self) -> bool {
        self.anomaly == 1
    }
}
