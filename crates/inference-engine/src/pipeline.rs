//! Inference Pipeline Implementation

use crate::prediction::{resolve_acquired_probability, PredictionResult};
use crate::InferenceError;
use artifact_store::ArtifactStore;
use data_validator::{InputValidator, ValidationConfig};
use feature_engine::{FeatureReconstructor, FeatureVector, RawInput, ReconstructionConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Reconstruct → scale → classify → bucket, over immutable artifacts.
///
/// Holds no per-request state; one instance serves all requests.
pub struct InferencePipeline {
    store: Arc<ArtifactStore>,
    reconstructor: FeatureReconstructor,
    validator: InputValidator,
}

impl InferencePipeline {
    /// Create a pipeline over loaded artifacts
    pub fn new(
        store: Arc<ArtifactStore>,
        reconstruction: &ReconstructionConfig,
        validation: ValidationConfig,
    ) -> Self {
        info!(
            "Creating inference pipeline: model={}, features={}",
            store.model_kind(),
            store.schema().len()
        );
        let reconstructor = FeatureReconstructor::new(store.schema(), reconstruction);
        Self {
            store,
            reconstructor,
            validator: InputValidator::new(validation),
        }
    }

    /// Pipeline with default feature engineering and validation settings
    pub fn with_defaults(store: Arc<ArtifactStore>) -> Self {
        Self::new(store, &ReconstructionConfig::default(), ValidationConfig::default())
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Unscaled feature vector for an input
    pub fn features(&self, raw: &RawInput) -> FeatureVector {
        self.reconstructor
            .reconstruct(raw, self.store.default_values())
    }

    /// Predict the outcome for a typed input
    pub fn predict(&self, raw: &RawInput) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();

        let features = self.features(raw);
        let expected = self.store.schema().len();
        if features.len() != expected {
            return Err(InferenceError::InvalidInputShape {
                expected,
                actual: features.len(),
            });
        }

        let scaled = self.store.transform(features.as_slice())?;
        if let Some(slot) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::InferenceFailed(format!(
                "scaled feature '{}' is not finite",
                self.store.feature_names()[slot]
            )));
        }

        let probabilities = self.store.predict_probability(&scaled)?;
        let p = resolve_acquired_probability(&probabilities)?;
        let result = PredictionResult::from_probability(p)?;

        debug!(
            "Prediction: {} (p={:.4}, risk={}, latency={}us)",
            result.prediction.as_str(),
            result.success_probability,
            result.risk_level.as_str(),
            start.elapsed().as_micros()
        );
        Ok(result)
    }

    /// Coerce a JSON request body, then predict
    pub fn predict_json(&self, body: &Value) -> Result<PredictionResult, InferenceError> {
        let raw = self.validator.coerce(body)?;
        self.predict(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{Outcome, RiskLevel};
    use artifact_store::{ArtifactConfig, ClassLabel, LogisticRegression, StandardScaler};
    use proptest::prelude::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn sample_pipeline() -> InferencePipeline {
        let dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../models"));
        let store = ArtifactStore::load(&ArtifactConfig::in_dir(dir)).unwrap();
        InferencePipeline::with_defaults(Arc::new(store))
    }

    /// Two-feature model whose acquired-probability is sigmoid(relationships - 10)
    fn relationship_pipeline(classes: Vec<ClassLabel>, acquired_first: bool) -> InferencePipeline {
        let sign = if acquired_first { -1.0 } else { 1.0 };
        let model = LogisticRegression {
            classes,
            coef: vec![vec![0.0, sign]],
            intercept: vec![-10.0 * sign],
        };
        let store = ArtifactStore::from_parts(
            vec!["funding_total_usd".into(), "relationships".into()],
            StandardScaler::default(),
            Box::new(model),
        )
        .unwrap();
        InferencePipeline::with_defaults(Arc::new(store))
    }

    fn scenario_body() -> Value {
        json!({
            "funding_total": 5000000,
            "funding_rounds": 3,
            "startup_age": 4,
            "milestones": 3,
            "relationships": 12,
            "avg_participants": 2,
            "category": "software",
            "state": "CA",
            "has_vc": 1,
            "has_angel": 0,
            "has_roundA": 1,
            "is_top500": 1
        })
    }

    #[test]
    fn test_end_to_end_scenario() {
        let pipeline = sample_pipeline();
        let result = pipeline.predict_json(&scenario_body()).unwrap();

        assert!((0.0..=1.0).contains(&result.success_probability));
        assert!((0.5..=1.0).contains(&result.confidence));
        assert_eq!(
            result.risk_level,
            RiskLevel::from_probability(result.success_probability)
        );

        let raw = InputValidator::default().coerce(&scenario_body()).unwrap();
        let features = pipeline.features(&raw);
        let schema = pipeline.store().schema();
        assert_eq!(features.get(schema, "is_tech"), Some(1.0));
        assert_eq!(features.get(schema, "in_major_hub"), Some(1.0));
        assert_eq!(features.get(schema, "hub_tech_combo"), Some(1.0));
    }

    #[test]
    fn test_empty_input_still_predicts() {
        let pipeline = sample_pipeline();
        let result = pipeline.predict_json(&json!({})).unwrap();
        assert!((0.0..=1.0).contains(&result.success_probability));
        assert_eq!(pipeline.predict(&RawInput::default()).unwrap(), result);
    }

    #[test]
    fn test_reversed_class_order_is_not_inverted() {
        let natural = relationship_pipeline(
            vec![ClassLabel::Text("closed".into()), ClassLabel::Text("acquired".into())],
            false,
        );
        let reversed = relationship_pipeline(
            vec![ClassLabel::Text("acquired".into()), ClassLabel::Text("closed".into())],
            true,
        );

        let strong = RawInput {
            relationships: Some(14.0),
            ..Default::default()
        };
        let a = natural.predict(&strong).unwrap();
        let b = reversed.predict(&strong).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.prediction, Outcome::Acquired);
        assert!(a.success_probability > 0.95);
    }

    #[test]
    fn test_integer_labels_resolve_class_one() {
        let pipeline = relationship_pipeline(vec![ClassLabel::Int(1), ClassLabel::Int(0)], true);
        let weak = RawInput {
            relationships: Some(2.0),
            ..Default::default()
        };
        let result = pipeline.predict(&weak).unwrap();
        assert_eq!(result.prediction, Outcome::Closed);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_very_large_startup_still_predicts() {
        let pipeline = sample_pipeline();
        let body = json!({"funding_total": 2e12, "startup_age": 250, "funding_rounds": 150});
        let result = pipeline.predict_json(&body).unwrap();
        assert!((0.0..=1.0).contains(&result.success_probability));
    }

    #[test]
    fn test_invalid_input_is_client_error() {
        let pipeline = sample_pipeline();
        let err = pipeline
            .predict_json(&json!({"funding_total": "a lot"}))
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("funding_total"));
    }

    #[test]
    fn test_dimension_mismatch_surfaces() {
        let model = LogisticRegression {
            classes: vec![ClassLabel::Int(0), ClassLabel::Int(1)],
            coef: vec![vec![0.1, 0.2, 0.3]],
            intercept: vec![0.0],
        };
        let store = ArtifactStore::from_parts(
            vec!["milestones".into(), "relationships".into()],
            StandardScaler::default(),
            Box::new(model),
        )
        .unwrap();
        let pipeline = InferencePipeline::with_defaults(Arc::new(store));

        let err = pipeline.predict(&RawInput::default()).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InvalidInputShape { expected: 3, actual: 2 }
        ));
        assert!(!err.is_client_error());
    }

    proptest! {
        #[test]
        fn prop_predict_is_deterministic(
            funding in 0.0..1e9f64,
            rounds in 0u32..20,
            age in 0.0..40.0f64,
            relationships in 0u32..200,
            category in "[a-z ]{0,12}",
        ) {
            let pipeline = sample_pipeline();
            let raw = RawInput {
                funding_total: Some(funding),
                funding_rounds: Some(rounds as f64),
                startup_age: Some(age),
                relationships: Some(relationships as f64),
                category: Some(category),
                ..Default::default()
            };
            let first = pipeline.predict(&raw).unwrap();
            let second = pipeline.predict(&raw).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!((0.0..=1.0).contains(&first.success_probability));
            prop_assert!(first.confidence >= 0.5);
        }
    }
}
