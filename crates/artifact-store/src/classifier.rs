//! Classifier Artifacts
//!
//! Serialized classifiers expose class-probability semantics keyed by the
//! class labels they were trained with. The label order is whatever the
//! training run produced, so callers must resolve classes by label.

use crate::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class label as recorded by the training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ClassLabel {
    /// Case-insensitive text comparison
    pub fn matches_text(&self, text: &str) -> bool {
        match self {
            ClassLabel::Text(label) => label.trim().eq_ignore_ascii_case(text),
            _ => false,
        }
    }

    /// Whether the label denotes the integer `value` (1, 1.0 or "1")
    pub fn matches_int(&self, value: i64) -> bool {
        match self {
            ClassLabel::Int(label) => *label == value,
            ClassLabel::Float(label) => *label == value as f64,
            ClassLabel::Text(label) => label.trim().parse::<i64>().ok() == Some(value),
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Int(v) => write!(f, "{}", v),
            ClassLabel::Float(v) => write!(f, "{}", v),
            ClassLabel::Text(v) => f.write_str(v),
        }
    }
}

/// A trained classifier with predict-probability-by-class semantics
pub trait Classifier: Send + Sync {
    /// Short model family name
    fn kind(&self) -> &'static str;

    /// Class labels, aligned with the output of [`Classifier::predict_proba`]
    fn classes(&self) -> &[ClassLabel];

    /// Number of input features, when the model records it
    fn n_features(&self) -> Option<usize>;

    /// Check the fitted parameters are consistent enough to evaluate
    fn validate(&self) -> Result<(), ArtifactError>;

    /// Class probabilities for one (already scaled) feature vector
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError>;
}

/// JSON model artifact, tagged by model family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl ModelArtifact {
    /// Validate the artifact and turn it into a classifier
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, ArtifactError> {
        match self {
            ModelArtifact::LogisticRegression(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            ModelArtifact::RandomForest(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
        }
    }
}

fn check_classes(classes: &[ClassLabel]) -> Result<(), ArtifactError> {
    if classes.len() < 2 {
        return Err(ArtifactError::InvalidModel(format!(
            "expected at least 2 classes, got {}",
            classes.len()
        )));
    }
    Ok(())
}

fn check_width(expected: usize, actual: usize) -> Result<(), ArtifactError> {
    if expected != actual {
        return Err(ArtifactError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Linear model with logistic (binary) or softmax (multi-class) link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<ClassLabel>,
    /// One row for binary models, one row per class otherwise
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    fn decision(&self, row: usize, features: &[f64]) -> Result<f64, ArtifactError> {
        let (coef, intercept) = self
            .coef
            .get(row)
            .zip(self.intercept.get(row))
            .ok_or_else(|| ArtifactError::Evaluation(format!("no intercept for row {}", row)))?;
        Ok(coef.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + intercept)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        self.coef.first().map(Vec::len)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        check_classes(&self.classes)?;

        let rows = if self.classes.len() == 2 { 1 } else { self.classes.len() };
        if self.coef.len() != rows {
            return Err(ArtifactError::InvalidModel(format!(
                "expected {} coefficient rows for {} classes, got {}",
                rows,
                self.classes.len(),
                self.coef.len()
            )));
        }
        if self.intercept.len() != rows {
            return Err(ArtifactError::InvalidModel(format!(
                "expected {} intercepts, got {}",
                rows,
                self.intercept.len()
            )));
        }

        let width = self.coef[0].len();
        if width == 0 || self.coef.iter().any(|row| row.len() != width) {
            return Err(ArtifactError::InvalidModel(
                "coefficient rows must be non-empty and of equal length".to_string(),
            ));
        }
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        let width = self
            .coef
            .first()
            .map(Vec::len)
            .ok_or_else(|| ArtifactError::Evaluation("model has no coefficients".to_string()))?;
        check_width(width, features.len())?;

        if self.coef.len() == 1 {
            // Binary models score classes[1]
            let p = sigmoid(self.decision(0, features)?);
            return Ok(vec![1.0 - p, p]);
        }

        let scores = (0..self.coef.len())
            .map(|row| self.decision(row, features))
            .collect::<Result<Vec<f64>, _>>()?;
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        Ok(exps.into_iter().map(|e| e / total).collect())
    }
}

/// Single fitted decision tree in flat array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise samples with
/// `x[feature[i]] <= threshold[i]` go left. `value[i]` holds class weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_classes: usize, n_features: Option<usize>) -> Result<(), ArtifactError> {
        let nodes = self.children_left.len();
        if nodes == 0
            || self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err(ArtifactError::InvalidModel(
                "tree arrays must be non-empty and of equal length".to_string(),
            ));
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left < 0 {
                if self.value[node].len() != n_classes {
                    return Err(ArtifactError::InvalidModel(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        self.value[node].len(),
                        n_classes
                    )));
                }
                continue;
            }
            let in_range = |child: i64| child > node as i64 && (child as usize) < nodes;
            if !in_range(left) || !in_range(right) {
                return Err(ArtifactError::InvalidModel(format!(
                    "node {} has out-of-range children",
                    node
                )));
            }
            let feature = self.feature[node];
            if feature < 0 || n_features.map_or(false, |n| feature as usize >= n) {
                return Err(ArtifactError::InvalidModel(format!(
                    "node {} splits on invalid feature {}",
                    node, feature
                )));
            }
        }
        Ok(())
    }

    /// Class weights of the leaf reached by `features`
    fn leaf(&self, features: &[f64]) -> Result<&[f64], ArtifactError> {
        let broken =
            |node: usize| ArtifactError::Evaluation(format!("malformed tree at node {}", node));

        // Any root-to-leaf path is shorter than the node count
        let mut node = 0usize;
        for _ in 0..self.children_left.len() {
            let left = *self.children_left.get(node).ok_or_else(|| broken(node))?;
            if left < 0 {
                return self.value.get(node).map(Vec::as_slice).ok_or_else(|| broken(node));
            }
            let right = *self.children_right.get(node).ok_or_else(|| broken(node))?;
            let threshold = *self.threshold.get(node).ok_or_else(|| broken(node))?;
            let feature = *self.feature.get(node).ok_or_else(|| broken(node))?;
            let x = usize::try_from(feature)
                .ok()
                .and_then(|f| features.get(f).copied())
                .ok_or_else(|| {
                    ArtifactError::Evaluation(format!("feature {} out of range", feature))
                })?;
            let next = if x <= threshold { left } else { right };
            node = usize::try_from(next).map_err(|_| broken(node))?;
        }
        Err(ArtifactError::Evaluation("tree walk did not reach a leaf".to_string()))
    }
}

/// Averaged ensemble of decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<ClassLabel>,
    #[serde(default)]
    pub n_features_in: Option<usize>,
    pub trees: Vec<DecisionTree>,
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features_in
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        check_classes(&self.classes)?;
        if self.trees.is_empty() {
            return Err(ArtifactError::InvalidModel("forest has no trees".to_string()));
        }
        for tree in &self.trees {
            tree.validate(self.classes.len(), self.n_features_in)?;
        }
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        if let Some(expected) = self.n_features_in {
            check_width(expected, features.len())?;
        }

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let weights = tree.leaf(features)?;
            let total: f64 = weights.iter().sum();
            if total.is_nan() || total <= 0.0 {
                return Err(ArtifactError::Evaluation(
                    "leaf with no class weight".to_string(),
                ));
            }
            for (p, w) in proba.iter_mut().zip(weights) {
                *p += w / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(proba.into_iter().map(|p| p / n_trees).collect())
    }
}
