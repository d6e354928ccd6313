//! ONNX inference using tract
//!
//! Loads a pre-trained model artifact and runs it on a single `[1, 5]`
//! `f32` row laid out in `FEATURE_NAMES` order.

use super::Scorer;
use crate::models::{FeatureVector, NUM_FEATURES};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 5;

/// Hex digits of the artifact digest used as the version label
const VERSION_LEN: usize = 12;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Scorer backed by an optimized tract plan
pub struct OnnxScorer {
    name: String,
    version: String,
    model: TractModel,
}

impl std::fmt::Debug for OnnxScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxScorer")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl OnnxScorer {
    /// Load a model artifact from disk
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {name} model {}", path.display()))?;
        Self::from_bytes(name, &bytes)
            .with_context(|| format!("Failed to load {name} model {}", path.display()))
    }

    /// Load a model from in-memory ONNX bytes
    pub fn from_bytes(name: &str, model_bytes: &[u8]) -> Result<Self> {
        let model = Self::load_model(model_bytes)?;
        let version = model_fingerprint(model_bytes)[..VERSION_LEN].to_string();
        debug!(model = %name, version = %version, size_bytes = model_bytes.len(), "Model parsed");
        Ok(Self {
            name: name.to_string(),
            version,
            model,
        })
    }

    fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn features_to_tensor(features: &FeatureVector) -> Result<Tensor> {
        let data: Vec<f32> = features.to_array().iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)
            .context("Failed to shape feature row")?;
        Ok(array.into())
    }
}

impl Scorer for OnnxScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        let start = Instant::now();
        let input = Self::features_to_tensor(features)?;

        let result = self
            .model
            .run(tvec!(input.into()))
            .with_context(|| format!("{} model run failed", self.name))?;
        let output = result
            .first()
            .with_context(|| format!("No output from {} model", self.name))?;
        let values = output
            .cast_to::<f64>()
            .with_context(|| format!("{} output is not numeric", self.name))?;
        let score = values
            .to_array_view::<f64>()?
            .iter()
            .next()
            .copied()
            .with_context(|| format!("{} output is empty", self.name))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(model = %self.name, elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(model = %self.name, elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(score)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// SHA-256 of a model artifact, hex encoded
pub fn model_fingerprint(model_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_bytes);
    hex::encode(hasher.finalize())
}
