//! Prediction Result and Class Resolution

use crate::InferenceError;
use artifact_store::ClassLabel;
use serde::{Deserialize, Serialize};

/// Probability at or above which a startup is predicted acquired
pub const DECISION_THRESHOLD: f64 = 0.5;
/// Probability at or above which risk is low
pub const LOW_RISK_THRESHOLD: f64 = 0.75;

/// Predicted outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Acquired,
    Closed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Acquired => "Acquired",
            Outcome::Closed => "Closed",
        }
    }
}

/// Coarse bucket of the success probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p >= LOW_RISK_THRESHOLD {
            RiskLevel::Low
        } else if p >= DECISION_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Prediction returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: Outcome,
    /// Probability of the "Acquired" class, 4 decimals
    pub success_probability: f64,
    /// max(p, 1 - p), 4 decimals
    pub confidence: f64,
    pub risk_level: RiskLevel,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl PredictionResult {
    /// Classify a success probability. Decisions use the unrounded value.
    pub fn from_probability(p: f64) -> Result<Self, InferenceError> {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(InferenceError::InvalidProbability(p));
        }

        let prediction = if p >= DECISION_THRESHOLD {
            Outcome::Acquired
        } else {
            Outcome::Closed
        };

        Ok(Self {
            prediction,
            success_probability: round4(p),
            confidence: round4(p.max(1.0 - p)),
            risk_level: RiskLevel::from_probability(p),
        })
    }
}

/// Probability of the "Acquired" class.
///
/// Class order differs between training runs, so the class is found by
/// label: a label equal to "acquired" (any case), else a label equal to 1,
/// else the second class.
pub fn resolve_acquired_probability(
    probabilities: &[(ClassLabel, f64)],
) -> Result<f64, InferenceError> {
    if probabilities.len() < 2 {
        return Err(InferenceError::InferenceFailed(format!(
            "expected at least 2 class probabilities, got {}",
            probabilities.len()
        )));
    }

    let by_label = probabilities
        .iter()
        .find(|(label, _)| label.matches_text("acquired"))
        .or_else(|| probabilities.iter().find(|(label, _)| label.matches_int(1)));

    let (_, p) = by_label.unwrap_or(&probabilities[1]);
    Ok(*p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ClassLabel {
        ClassLabel::Text(s.to_string())
    }

    #[test]
    fn test_resolves_acquired_label_in_any_position() {
        let reversed = vec![(text("Acquired"), 0.8), (text("closed"), 0.2)];
        assert_eq!(resolve_acquired_probability(&reversed).unwrap(), 0.8);

        let natural = vec![(text("closed"), 0.3), (text("ACQUIRED"), 0.7)];
        assert_eq!(resolve_acquired_probability(&natural).unwrap(), 0.7);
    }

    #[test]
    fn test_resolves_integer_one() {
        let reversed = vec![(ClassLabel::Int(1), 0.9), (ClassLabel::Int(0), 0.1)];
        assert_eq!(resolve_acquired_probability(&reversed).unwrap(), 0.9);
    }

    #[test]
    fn test_text_label_beats_integer_label() {
        let mixed = vec![(ClassLabel::Int(1), 0.4), (text("acquired"), 0.6)];
        assert_eq!(resolve_acquired_probability(&mixed).unwrap(), 0.6);
    }

    #[test]
    fn test_falls_back_to_second_class() {
        let unnamed = vec![(text("no"), 0.35), (text("yes"), 0.65)];
        assert_eq!(resolve_acquired_probability(&unnamed).unwrap(), 0.65);
    }

    #[test]
    fn test_single_class_is_an_error() {
        let single = vec![(text("acquired"), 1.0)];
        assert!(resolve_acquired_probability(&single).is_err());
    }

    #[test]
    fn test_thresholds() {
        let r = PredictionResult::from_probability(0.75).unwrap();
        assert_eq!(r.prediction, Outcome::Acquired);
        assert_eq!(r.risk_level, RiskLevel::Low);

        let r = PredictionResult::from_probability(0.5).unwrap();
        assert_eq!(r.prediction, Outcome::Acquired);
        assert_eq!(r.risk_level, RiskLevel::Medium);
        assert_eq!(r.confidence, 0.5);

        let r = PredictionResult::from_probability(0.4999).unwrap();
        assert_eq!(r.prediction, Outcome::Closed);
        assert_eq!(r.risk_level, RiskLevel::High);
        assert_eq!(r.confidence, 0.5001);
    }

    #[test]
    fn test_rounding_to_four_places() {
        let r = PredictionResult::from_probability(0.123456).unwrap();
        assert_eq!(r.success_probability, 0.1235);
        assert_eq!(r.confidence, 0.8765);
    }

    #[test]
    fn test_rejects_invalid_probability() {
        assert!(PredictionResult::from_probability(f64::NAN).is_err());
        assert!(PredictionResult::from_probability(1.2).is_err());
        assert!(PredictionResult::from_probability(-0.1).is_err());
    }

    #[test]
    fn test_serializes_wire_names() {
        let r = PredictionResult::from_probability(0.9).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["prediction"], "Acquired");
        assert_eq!(json["risk_level"], "Low");
        assert_eq!(json["success_probability"], 0.9);
    }
}
