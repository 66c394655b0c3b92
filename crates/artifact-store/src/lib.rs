//! Model Artifact Store
//!
//! Loads the trained classifier, its companion scaler and the ordered
//! feature-name list once at startup and serves them read-only.

mod classifier;
#[cfg(feature = "onnx")]
mod onnx;
mod scaler;
mod schema;
mod store;

pub use classifier::{
    ClassLabel, Classifier, DecisionTree, LogisticRegression, ModelArtifact, RandomForest,
};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use scaler::StandardScaler;
pub use schema::FeatureSchema;
pub use store::{ArtifactConfig, ArtifactStore};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or evaluating model artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("Failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Corrupt artifact {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("Feature name list is empty")]
    EmptySchema,
    #[error("Duplicate feature name in schema: {0}")]
    DuplicateFeature(String),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}
