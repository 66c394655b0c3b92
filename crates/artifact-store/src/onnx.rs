//! ONNX classifier executed with tract

use crate::classifier::{ClassLabel, Classifier};
use crate::ArtifactError;
use std::path::Path;
use tract_onnx::prelude::*;

/// Classifier exported to ONNX (e.g. with zipmap disabled).
///
/// The last graph output must be the `[1, n_classes]` probability tensor.
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    classes: Vec<ClassLabel>,
    n_features: usize,
}

fn corrupt(path: &Path, err: impl std::fmt::Display) -> ArtifactError {
    ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

impl OnnxClassifier {
    /// Load and optimize the graph for a single-row input
    pub fn load(
        path: &Path,
        classes: Vec<ClassLabel>,
        n_features: usize,
    ) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::Missing(path.to_path_buf()));
        }
        if classes.len() < 2 {
            return Err(corrupt(path, "ONNX models need at least 2 configured class labels"));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| corrupt(path, e))?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .map_err(|e| corrupt(path, e))?
            .into_optimized()
            .map_err(|e| corrupt(path, e))?
            .into_runnable()
            .map_err(|e| corrupt(path, e))?;

        Ok(Self {
            plan,
            classes,
            n_features,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.classes.len() < 2 || self.n_features == 0 {
            return Err(ArtifactError::InvalidModel(format!(
                "ONNX model with {} classes and {} features",
                self.classes.len(),
                self.n_features
            )));
        }
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        if features.len() != self.n_features {
            return Err(ArtifactError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let row: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), row)
            .map_err(|e| ArtifactError::Evaluation(e.to_string()))?
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ArtifactError::Evaluation(e.to_string()))?;
        let proba = outputs
            .last()
            .ok_or_else(|| ArtifactError::Evaluation("model produced no outputs".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| ArtifactError::Evaluation(e.to_string()))?
            .iter()
            .map(|p| *p as f64)
            .collect();

        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<ClassLabel> {
        vec![ClassLabel::Int(0), ClassLabel::Int(1)]
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        let err = OnnxClassifier::load(&path, labels(), 3).err().unwrap();
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_requires_two_class_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"\x00\x01").unwrap();

        let err = OnnxClassifier::load(&path, vec![ClassLabel::Int(1)], 3).err().unwrap();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_unparsable_graph_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not a protobuf graph").unwrap();

        let err = OnnxClassifier::load(&path, labels(), 3).err().unwrap();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }
}
