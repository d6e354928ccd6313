//! Server configuration

use anyhow::Result;
use pdm_core::{parser::ParseMode, store::DEFAULT_HISTORY_LIMIT};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, from `pdm.toml` and `PDM_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in structured log events
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// ONNX anomaly classifier
    #[serde(default = "default_classifier_path")]
    pub classifier_path: PathBuf,

    /// ONNX remaining-life regressor
    #[serde(default = "default_regressor_path")]
    pub regressor_path: PathBuf,

    /// Reject unparsable sensor values instead of storing 0.0
    #[serde(default)]
    pub strict_parsing: bool,

    /// Upper bound for `GET /history?limit=`
    #[serde(default = "default_history_max_limit")]
    pub history_max_limit: usize,
}

fn default_service_name() -> String {
    "pdm-server".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("sensor_data.db")
}

fn default_classifier_path() -> PathBuf {
    PathBuf::from("clf.onnx")
}

fn default_regressor_path() -> PathBuf {
    PathBuf::from("regressor.onnx")
}

fn default_history_max_limit() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            classifier_path: default_classifier_path(),
            regressor_path: default_regressor_path(),
            strict_parsing: false,
            history_max_limit: default_history_max_limit(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `pdm.toml` (optional) and the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("pdm").required(false))
            .add_source(config::Environment::with_prefix("PDM"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn parse_mode(&self) -> ParseMode {
        if self.strict_parsing {
            ParseMode::Strict
        } else {
            ParseMode::Permissive
        }
    }

    /// Never below the default history size
    pub fn effective_history_max(&self) -> usize {
        self.history_max_limit.max(DEFAULT_HISTORY_LIMIT)
    }
}
