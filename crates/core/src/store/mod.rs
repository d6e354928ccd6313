//! Telemetry storage
//!
//! The store is an append-only ordered log of sensor readings. It assigns
//! ids and timestamps on insert and is the only shared mutable resource of
//! the pipeline; implementations must serialize concurrent inserts.

mod sqlite;

pub use sqlite::{SqliteStore, IN_MEMORY_PATH};

use crate::error::PredictResult;
use crate::models::{ReadingFields, SensorReading};
use async_trait::async_trait;

/// Default number of readings returned by a history query
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Append-only telemetry log
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Append a reading; assigns a strictly increasing id and a
    /// non-decreasing timestamp.
    async fn insert(&self, fields: ReadingFields) -> PredictResult<SensorReading>;

    /// Up to `limit` most recent readings, newest first
    async fn query_recent(&self, limit: usize) -> PredictResult<Vec<SensorReading>>;

    /// Every reading, oldest first
    async fn query_all_ordered(&self) -> PredictResult<Vec<SensorReading>>;

    /// Number of stored readings
    async fn count(&self) -> PredictResult<u64>;

    /// The most recent reading, if any
    async fn latest(&self) -> PredictResult<Option<SensorReading>> {
        Ok(self.query_recent(1).await?.into_iter().next())
    }
}
