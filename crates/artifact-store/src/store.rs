//! Artifact Store Implementation

use crate::classifier::{ClassLabel, Classifier, ModelArtifact};
use crate::scaler::StandardScaler;
use crate::schema::FeatureSchema;
use crate::ArtifactError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding the three artifacts
    pub dir: PathBuf,
    /// Classifier file (`.json`, or `.onnx` with the `onnx` feature)
    pub model_file: String,
    pub scaler_file: String,
    pub feature_names_file: String,
    /// Class labels of an ONNX classifier, in output order
    pub onnx_classes: Vec<ClassLabel>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            model_file: "model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            feature_names_file: "feature_names.json".to_string(),
            onnx_classes: Vec::new(),
        }
    }
}

impl ArtifactConfig {
    /// Config pointing at a directory with the default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }

    pub fn feature_names_path(&self) -> PathBuf {
        self.dir.join(&self.feature_names_file)
    }
}

/// Immutable holder of the classifier, scaler and feature schema.
///
/// Built once at startup and shared read-only across requests.
pub struct ArtifactStore {
    schema: FeatureSchema,
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
    defaults: Vec<f64>,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("features", &self.schema.len())
            .field("model", &self.classifier.kind())
            .field("classes", &self.classifier.classes())
            .finish()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn load_classifier(
    config: &ArtifactConfig,
    n_features: usize,
) -> Result<Box<dyn Classifier>, ArtifactError> {
    let path = config.model_path();
    let is_onnx = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("onnx"));

    if is_onnx {
        return load_onnx(&path, config, n_features);
    }

    let artifact: ModelArtifact = read_json(&path)?;
    artifact.into_classifier().map_err(|e| ArtifactError::Corrupt {
        path,
        reason: e.to_string(),
    })
}

#[cfg(feature = "onnx")]
fn load_onnx(
    path: &Path,
    config: &ArtifactConfig,
    n_features: usize,
) -> Result<Box<dyn Classifier>, ArtifactError> {
    let model = crate::onnx::OnnxClassifier::load(path, config.onnx_classes.clone(), n_features)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(
    path: &Path,
    _config: &ArtifactConfig,
    _n_features: usize,
) -> Result<Box<dyn Classifier>, ArtifactError> {
    Err(ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: "ONNX models require the `onnx` feature".to_string(),
    })
}

impl ArtifactStore {
    /// Load all three artifacts. Any failure is fatal for serving.
    pub fn load(config: &ArtifactConfig) -> Result<Self, ArtifactError> {
        info!("Loading model artifacts from {}", config.dir.display());

        let names: Vec<String> = read_json(&config.feature_names_path())?;
        let schema = FeatureSchema::new(names)?;
        info!("{} features loaded", schema.len());
        debug!(
            "First features: {:?}",
            &schema.names()[..schema.len().min(10)]
        );

        let scaler_path = config.scaler_path();
        let scaler: StandardScaler = read_json(&scaler_path)?;
        scaler.check().map_err(|reason| ArtifactError::Corrupt {
            path: scaler_path,
            reason,
        })?;
        info!("Scaler loaded");

        let classifier = load_classifier(config, schema.len())?;
        info!(
            "Model loaded: {} with classes {:?}",
            classifier.kind(),
            classifier.classes()
        );

        Ok(Self::assemble(schema, scaler, classifier))
    }

    /// Build a store from in-memory artifacts
    pub fn from_parts(
        feature_names: Vec<String>,
        scaler: StandardScaler,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ArtifactError> {
        let schema = FeatureSchema::new(feature_names)?;
        scaler.check().map_err(ArtifactError::InvalidModel)?;
        classifier.validate()?;
        Ok(Self::assemble(schema, scaler, classifier))
    }

    fn assemble(
        schema: FeatureSchema,
        scaler: StandardScaler,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        let defaults = match scaler.mean() {
            Some(mean) if mean.len() == schema.len() => mean.to_vec(),
            Some(mean) => {
                warn!(
                    "Scaler mean has {} entries for {} features; defaulting to 0.0",
                    mean.len(),
                    schema.len()
                );
                vec![0.0; schema.len()]
            }
            None => vec![0.0; schema.len()],
        };

        if let Some(n) = classifier.n_features() {
            if n != schema.len() {
                warn!(
                    "Classifier expects {} features but schema has {}",
                    n,
                    schema.len()
                );
            }
        }

        Self {
            schema,
            scaler,
            classifier,
            defaults,
        }
    }

    /// Feature names in training order
    pub fn feature_names(&self) -> &[String] {
        self.schema.names()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Per-slot defaults: scaler means when they cover the schema, else 0.0
    pub fn default_values(&self) -> &[f64] {
        &self.defaults
    }

    /// Per-feature defaults keyed by feature name
    pub fn scaler_defaults(&self) -> HashMap<&str, f64> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.defaults.iter().copied())
            .collect()
    }

    /// Scale a feature vector with the loaded scaler
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        if values.len() != self.schema.len() {
            return Err(ArtifactError::DimensionMismatch {
                expected: self.schema.len(),
                actual: values.len(),
            });
        }
        self.scaler.transform(values)
    }

    /// Class probabilities keyed by class label, in the classifier's order
    pub fn predict_probability(
        &self,
        values: &[f64],
    ) -> Result<Vec<(ClassLabel, f64)>, ArtifactError> {
        let proba = self.classifier.predict_proba(values)?;
        let classes = self.classifier.classes();
        if proba.len() != classes.len() {
            return Err(ArtifactError::Evaluation(format!(
                "model returned {} probabilities for {} classes",
                proba.len(),
                classes.len()
            )));
        }
        Ok(classes.iter().cloned().zip(proba).collect())
    }

    pub fn classes(&self) -> &[ClassLabel] {
        self.classifier.classes()
    }

    pub fn model_kind(&self) -> &'static str {
        self.classifier.kind()
    }

    pub fn has_scaler_mean(&self) -> bool {
        matches!(self.scaler.mean(), Some(mean) if mean.len() == self.schema.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LogisticRegression;
    use std::fs;

    fn sample_dir() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../models"))
    }

    fn tiny_store(mean: Option<Vec<f64>>) -> ArtifactStore {
        let model = LogisticRegression {
            classes: vec![ClassLabel::Int(0), ClassLabel::Int(1)],
            coef: vec![vec![1.0, -1.0, 0.5]],
            intercept: vec![0.0],
        };
        ArtifactStore::from_parts(
            vec!["a".into(), "b".into(), "c".into()],
            StandardScaler {
                mean,
                scale: None,
                n_features_in: None,
            },
            Box::new(model),
        )
        .unwrap()
    }

    fn write_artifacts(dir: &Path, names: &str, scaler: &str, model: &str) -> ArtifactConfig {
        fs::write(dir.join("feature_names.json"), names).unwrap();
        fs::write(dir.join("scaler.json"), scaler).unwrap();
        fs::write(dir.join("model.json"), model).unwrap();
        ArtifactConfig::in_dir(dir)
    }

    const MODEL: &str = r#"{"kind":"logistic_regression","classes":[0,1],"coef":[[0.1,0.2]],"intercept":[0.0]}"#;

    #[test]
    fn test_load_sample_artifacts() {
        let store = ArtifactStore::load(&ArtifactConfig::in_dir(sample_dir())).unwrap();
        assert!(!store.feature_names().is_empty());
        assert_eq!(store.default_values().len(), store.schema().len());
        assert!(store.has_scaler_mean());
        assert_eq!(store.classes().len(), 2);
    }

    #[test]
    fn test_defaults_use_scaler_mean() {
        let store = tiny_store(Some(vec![1.0, 2.0, 3.0]));
        let defaults = store.scaler_defaults();
        assert_eq!(defaults["a"], 1.0);
        assert_eq!(defaults["c"], 3.0);
    }

    #[test]
    fn test_defaults_zero_without_mean() {
        let store = tiny_store(None);
        assert!(store.default_values().iter().all(|v| *v == 0.0));
        assert!(!store.has_scaler_mean());
    }

    #[test]
    fn test_defaults_zero_when_mean_length_differs() {
        let store = tiny_store(Some(vec![5.0, 5.0]));
        assert_eq!(store.default_values(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_transform_rejects_wrong_length() {
        let store = tiny_store(None);
        assert!(matches!(
            store.transform(&[1.0]),
            Err(ArtifactError::DimensionMismatch { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_predict_probability_pairs_labels() {
        let store = tiny_store(None);
        let proba = store.predict_probability(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(proba[0].0, ClassLabel::Int(0));
        assert_eq!(proba[1].0, ClassLabel::Int(1));
        assert!((proba[1].1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_parts_rejects_invalid_classifier() {
        let empty = LogisticRegression {
            classes: vec![ClassLabel::Int(0), ClassLabel::Int(1)],
            coef: vec![],
            intercept: vec![],
        };
        let err = ArtifactStore::from_parts(
            vec!["milestones".into()],
            StandardScaler::default(),
            Box::new(empty),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidModel(_)));
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactStore::load(&ArtifactConfig::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_corrupt_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), r#"["a","b"]"#, "{}", "not json");
        let err = ArtifactStore::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_empty_feature_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), "[]", "{}", MODEL);
        let err = ArtifactStore::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::EmptySchema));
    }

    #[test]
    fn test_invalid_model_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let model = r#"{"kind":"logistic_regression","classes":[1],"coef":[[0.1]],"intercept":[0.0]}"#;
        let config = write_artifacts(dir.path(), r#"["a"]"#, "{}", model);
        let err = ArtifactStore::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_onnx_requires_feature() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_artifacts(dir.path(), r#"["a","b"]"#, "{}", MODEL);
        config.model_file = "model.onnx".to_string();
        fs::write(config.model_path(), b"\x00\x01").unwrap();
        assert!(ArtifactStore::load(&config).is_err());
    }
}
