//! Telemetry CLI commands: ingest, history, series

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, ReadingInput, SensorReading};
use crate::output::{format_timestamp, format_value, print_success, print_warning, OutputFormat};

/// Row for readings table
#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Vibration")]
    vibration: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Voltage")]
    voltage: String,
}

impl From<&SensorReading> for ReadingRow {
    fn from(r: &SensorReading) -> Self {
        Self {
            id: r.id,
            timestamp: format_timestamp(&r.timestamp),
            temperature: format_value(r.temperature),
            humidity: format_value(r.humidity),
            vibration: format_value(r.vibration),
            current: format_value(r.current),
            voltage: format_value(r.voltage),
        }
    }
}

/// Send one reading to the server
pub async fn ingest(client: &ApiClient, reading: ReadingInput) -> Result<()> {
    let message = client.ingest(&reading).await?;
    print_success(message.trim());
    Ok(())
}

/// Show the most recent readings, newest first
pub async fn show_history(client: &ApiClient, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let readings = client.history(limit).await?;
    print_readings(&readings, format)
}

/// Show every reading, oldest first
pub async fn show_series(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let readings = client.series().await?;
    print_readings(&readings, format)
}

fn print_readings(readings: &[SensorReading], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(readings)?);
        }
        OutputFormat::Table => {
            if readings.is_empty() {
                print_warning("No readings stored yet");
                return Ok(());
            }

            let rows: Vec<ReadingRow> = readings.iter().map(ReadingRow::from).collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} readings", readings.len());
        }
    }

    Ok(())
}
