//! Numeric coercion for ingestion parameters
//!
//! Sensors in the field send whatever their firmware produces, so the
//! default policy never rejects a reading: absent, malformed or non-finite
//! values become `0.0`. Strict mode turns the latter two into errors.

use crate::error::{PredictError, PredictResult};
use crate::models::{RawReading, ReadingFields};
use tracing::debug;

/// Value substituted for absent, unparsable or non-finite fields
pub const DEFAULT_FIELD_VALUE: f64 = 0.0;

/// How malformed values are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Substitute [`DEFAULT_FIELD_VALUE`]
    #[default]
    Permissive,
    /// Reject with [`PredictError::InvalidInput`]
    Strict,
}

/// Converts raw ingestion parameters into sensor values
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingParser {
    mode: ParseMode,
}

impl ReadingParser {
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    pub fn permissive() -> Self {
        Self::new(ParseMode::Permissive)
    }

    pub fn strict() -> Self {
        Self::new(ParseMode::Strict)
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn parse(&self, raw: &RawReading) -> PredictResult<ReadingFields> {
        Ok(ReadingFields {
            temperature: self.parse_field("temperature", raw.temperature.as_deref())?,
            humidity: self.parse_field("humidity", raw.humidity.as_deref())?,
            vibration: self.parse_field("vibration", raw.vibration.as_deref())?,
            current: self.parse_field("current", raw.current.as_deref())?,
            voltage: self.parse_field("voltage", raw.voltage.as_deref())?,
        })
    }

    fn parse_field(&self, field: &'static str, value: Option<&str>) -> PredictResult<f64> {
        let Some(raw) = value else {
            return Ok(DEFAULT_FIELD_VALUE);
        };

        // NaN binds as NULL in SQLite and infinities have no JSON form
        match raw.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(parsed),
            _ if self.mode == ParseMode::Permissive => {
                debug!(field, value = %raw, "Unusable sensor value, substituting default");
                Ok(DEFAULT_FIELD_VALUE)
            }
            _ => Err(PredictError::InvalidInput {
                field,
                value: raw.to_string(),
            }),
        }
    }
}
