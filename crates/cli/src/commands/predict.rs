//! Prediction and health CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_anomaly, color_status, print_info, OutputFormat};

/// Row for health components table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Predict anomaly and time to failure from the latest reading
pub async fn show_prediction(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let prediction = client.predict().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        OutputFormat::Table => {
            println!("{}", "Latest Prediction".bold());
            println!("{}", "=".repeat(40));
            println!("Status:          {}", color_anomaly(prediction.anomaly));
            println!("Time to failure: {:.2}", prediction.time_to_failure);
        }
    }

    Ok(())
}

/// Show server component health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        OutputFormat::Table => {
            println!("Server: {}", color_status(&health.status));
            if health.components.is_empty() {
                print_info("No components registered");
                return Ok(());
            }

            let rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, c)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&c.status),
                    message: c.message.clone().unwrap_or_default(),
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
