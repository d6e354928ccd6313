//! Predictive Maintenance CLI
//!
//! A command-line tool for pushing sensor readings, browsing stored
//! telemetry and requesting predictions from the server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client::ReadingInput;
use commands::{predict, readings};

/// Predictive Maintenance CLI
#[derive(Parser)]
#[command(name = "pdm")]
#[command(author, version, about = "CLI for the Predictive Maintenance service", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via PDM_API_URL env var or ~/.config/pdm/config.json)
    #[arg(long, env = "PDM_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a sensor reading (omitted fields default to 0)
    Ingest(IngestArgs),

    /// Show the most recent readings
    History {
        /// Maximum number of readings (server default: 100)
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show every stored reading, oldest first
    Series,

    /// Predict anomaly and time to failure from the latest reading
    Predict,

    /// Show server health
    Health,
}

#[derive(Args, Debug, Default)]
pub struct IngestArgs {
    #[arg(long)]
    pub temperature: Option<f64>,
    #[arg(long)]
    pub humidity: Option<f64>,
    #[arg(long)]
    pub vibration: Option<f64>,
    #[arg(long)]
    pub current: Option<f64>,
    #[arg(long)]
    pub voltage: Option<f64>,
}

impl From<IngestArgs> for ReadingInput {
    fn from(args: IngestArgs) -> Self {
        Self {
            temperature: args.temperature,
            humidity: args.humidity,
            vibration: args.vibration,
            current: args.current,
            voltage: args.voltage,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        output::print_error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Ingest(args) => readings::ingest(&client, args.into()).await?,
        Commands::History { limit } => readings::show_history(&client, limit, cli.format).await?,
        Commands::Series => readings::show_series(&client, cli.format).await?,
        Commands::Predict => predict::show_prediction(&client, cli.format).await?,
        Commands::Health => predict::show_health(&client, cli.format).await?,
    }

    Ok(())
}
