//! Startup Outcome Inference
//!
//! Runs reconstruction, scaling and classification over the loaded
//! artifacts and turns the class probabilities into a prediction.

mod pipeline;
mod prediction;

pub use pipeline::InferencePipeline;
pub use prediction::{resolve_acquired_probability, Outcome, PredictionResult, RiskLevel};

use artifact_store::ArtifactError;
use data_validator::ValidationError;
use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Invalid probability from model: {0}")]
    InvalidProbability(f64),
}

impl InferenceError {
    /// Whether the caller, not the service, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, InferenceError::InvalidInput(_))
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::InvalidInput(_) => "invalid_input",
            InferenceError::InferenceFailed(_) => "inference_failed",
            InferenceError::InvalidInputShape { .. } => "invalid_shape",
            InferenceError::InvalidProbability(_) => "invalid_probability",
        }
    }
}

impl From<ArtifactError> for InferenceError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::DimensionMismatch { expected, actual } => {
                InferenceError::InvalidInputShape { expected, actual }
            }
            other => InferenceError::InferenceFailed(other.to_string()),
        }
    }
}
