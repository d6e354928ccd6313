//! SQLite-backed telemetry store

use super::TelemetryStore;
use crate::error::{PredictError, PredictResult};
use crate::models::{ReadingFields, SensorReading};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Path value that selects a private in-memory database
pub const IN_MEMORY_PATH: &str = ":memory:";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sensor_values (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        temperature REAL NOT NULL DEFAULT 0,
        humidity REAL NOT NULL DEFAULT 0,
        vibration REAL NOT NULL DEFAULT 0,
        current REAL NOT NULL DEFAULT 0,
        voltage REAL NOT NULL DEFAULT 0,
        timestamp TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sensor_values_timestamp ON sensor_values(timestamp);
";

const SELECT_COLUMNS: &str =
    "SELECT id, temperature, humidity, vibration, current, voltage, timestamp FROM sensor_values";

/// Telemetry store on a single SQLite table.
///
/// The connection sits behind a mutex so writes are serialized; all
/// statements run on Tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`. `":memory:"` opens a
    /// private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY_PATH {
            return Self::open_in_memory();
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!(error = %err, "Failed to enable WAL mode");
        }

        let store = Self::init(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "Telemetry store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("failed to create sensor_values table")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file, or `None` for an in-memory store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| anyhow!("database connection lock poisoned"))?;
            task(&mut guard)
        })
        .await
        .map_err(|err| anyhow!("database task terminated unexpectedly: {err}"))?
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp '{value}'"))
}

fn row_to_reading(row: &Row<'_>) -> rusqlite::Result<SensorReading> {
    let raw_timestamp: String = row.get(6)?;
    let timestamp = parse_timestamp(&raw_timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?;

    Ok(SensorReading {
        id: row.get(0)?,
        temperature: row.get(1)?,
        humidity: row.get(2)?,
        vibration: row.get(3)?,
        current: row.get(4)?,
        voltage: row.get(5)?,
        timestamp,
    })
}

/// Current time, never earlier than the newest stored timestamp
fn next_timestamp(conn: &Connection) -> Result<DateTime<Utc>> {
    let now = Utc::now().trunc_subsecs(6);
    let last: Option<String> = conn
        .query_row(
            "SELECT timestamp FROM sensor_values ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .context("failed to read last timestamp")?;

    match last {
        Some(raw) => {
            let last = parse_timestamp(&raw)?;
            if last > now {
                warn!(last = %raw, "Clock moved backwards, reusing last timestamp");
                Ok(last)
            } else {
                Ok(now)
            }
        }
        None => Ok(now),
    }
}

#[async_trait]
impl TelemetryStore for SqliteStore {
    async fn insert(&self, fields: ReadingFields) -> PredictResult<SensorReading> {
        self.execute(move |conn| {
            let tx = conn.transaction().context("failed to begin transaction")?;
            let timestamp = next_timestamp(&tx)?;
            tx.execute(
                "INSERT INTO sensor_values (temperature, humidity, vibration, current, voltage, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    fields.temperature,
                    fields.humidity,
                    fields.vibration,
                    fields.current,
                    fields.voltage,
                    format_timestamp(&timestamp),
                ],
            )
            .context("failed to insert reading")?;
            let id = tx.last_insert_rowid();
            tx.commit().context("failed to commit reading")?;

            debug!(id, "Reading stored");
            Ok(fields.into_reading(id, timestamp))
        })
        .await
        .map_err(PredictError::storage)
    }

    async fn query_recent(&self, limit: usize) -> PredictResult<Vec<SensorReading>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{SELECT_COLUMNS} ORDER BY timestamp DESC, id DESC LIMIT ?1"
                ))
                .context("failed to prepare history query")?;
            let readings = stmt
                .query_map(params![limit], row_to_reading)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("failed to read history")?;
            Ok(readings)
        })
        .await
        .map_err(PredictError::storage)
    }

    async fn query_all_ordered(&self) -> PredictResult<Vec<SensorReading>> {
        self.execute(|conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_COLUMNS} ORDER BY timestamp ASC, id ASC"))
                .context("failed to prepare series query")?;
            let readings = stmt
                .query_map([], row_to_reading)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("failed to read series")?;
            Ok(readings)
        })
        .await
        .map_err(PredictError::storage)
    }

    async fn count(&self) -> PredictResult<u64> {
        self.execute(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM sensor_values", [], |row| row.get(0))
                .context("failed to count readings")?;
            u64::try_from(count).map_err(|_| anyhow!("negative row count {count}"))
        })
        .await
        .map_err(PredictError::storage)
    }
}
