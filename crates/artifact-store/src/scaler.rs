//! Standard Scaler

use crate::ArtifactError;
use serde::{Deserialize, Serialize};

/// Fitted standardization transform: `(x - mean) / scale`.
///
/// Either vector may be absent (a scaler fitted without centering or
/// without scaling). Zero scales are treated as 1.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
    #[serde(default)]
    pub n_features_in: Option<usize>,
}

impl StandardScaler {
    /// Number of features the scaler was fitted on, when recorded
    pub fn n_features(&self) -> Option<usize> {
        self.n_features_in
            .or_else(|| self.mean.as_ref().map(Vec::len))
            .or_else(|| self.scale.as_ref().map(Vec::len))
    }

    /// Per-feature means, if the scaler carries them
    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    /// Check the fitted vectors agree with each other
    pub fn check(&self) -> Result<(), String> {
        let n = match self.n_features() {
            Some(n) => n,
            None => return Ok(()),
        };
        if let Some(mean) = &self.mean {
            if mean.len() != n {
                return Err(format!("mean has {} entries, expected {}", mean.len(), n));
            }
        }
        if let Some(scale) = &self.scale {
            if scale.len() != n {
                return Err(format!("scale has {} entries, expected {}", scale.len(), n));
            }
            if scale.iter().any(|s| !s.is_finite() || *s < 0.0) {
                return Err("scale contains negative or non-finite entries".to_string());
            }
        }
        Ok(())
    }

    /// Apply the transform to one feature vector
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        if let Some(expected) = self.n_features() {
            if expected != values.len() {
                return Err(ArtifactError::DimensionMismatch {
                    expected,
                    actual: values.len(),
                });
            }
        }

        let scaled = values
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let mean = self.mean.as_ref().and_then(|m| m.get(i).copied()).unwrap_or(0.0);
                let scale = self
                    .scale
                    .as_ref()
                    .and_then(|s| s.get(i).copied())
                    .filter(|s| *s != 0.0)
                    .unwrap_or(1.0);
                (x - mean) / scale
            })
            .collect();

        Ok(scaled)
    }
}
