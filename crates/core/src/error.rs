//! Error taxonomy surfaced at the pipeline boundary

/// Errors returned by ingestion, storage and prediction operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    /// A provided value could not be parsed as a number (strict parsing only)
    #[error("Invalid value for {field}: {value:?}")]
    InvalidInput { field: &'static str, value: String },

    /// Feature extraction was requested without a reading
    #[error("No reading supplied for feature extraction")]
    MissingInput,

    /// The persistence layer could not complete a read or write
    #[error("Storage fault: {0}")]
    StorageFault(String),

    /// Prediction was requested before any reading was stored
    #[error("No data found")]
    NoDataAvailable,

    /// A scoring function failed or returned an unusable value
    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    /// A model artifact could not be loaded at startup
    #[error("Model unavailable: {0}")]
    ModelLoadFault(String),
}

impl PredictError {
    /// Wrap an `anyhow` chain from the storage layer, keeping every cause
    pub fn storage(err: anyhow::Error) -> Self {
        Self::StorageFault(format!("{err:#}"))
    }

    /// Wrap an `anyhow` chain from a scorer, keeping every cause
    pub fn inference(err: anyhow::Error) -> Self {
        Self::InferenceFailure(format!("{err:#}"))
    }

    /// Short machine-readable code used in logs and error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::MissingInput => "missing_input",
            Self::StorageFault(_) => "storage_fault",
            Self::NoDataAvailable => "no_data",
            Self::InferenceFailure(_) => "inference_failure",
            Self::ModelLoadFault(_) => "model_unavailable",
        }
    }
}

pub type PredictResult<T> = std::result::Result<T, PredictError>;
