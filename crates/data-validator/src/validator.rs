//! Request Validator for Coercion and Range Checking

use crate::coerce;
use crate::error::ValidationError;
use feature_engine::RawInput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Accepted ranges of the numeric inputs.
///
/// Only the lower bound of zero applies by default; maximums are unbounded
/// and can be tightened per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Total funding valid range (USD)
    pub funding_total_range: (f64, f64),
    pub funding_rounds_range: (f64, f64),
    /// Startup age valid range (years)
    pub startup_age_range: (f64, f64),
    pub milestones_range: (f64, f64),
    pub relationships_range: (f64, f64),
    pub avg_participants_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            funding_total_range: (0.0, f64::INFINITY),
            funding_rounds_range: (0.0, f64::INFINITY),
            startup_age_range: (0.0, f64::INFINITY),
            milestones_range: (0.0, f64::INFINITY),
            relationships_range: (0.0, f64::INFINITY),
            avg_participants_range: (0.0, f64::INFINITY),
        }
    }
}

/// First present, non-null key wins for aliased fields
fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::Null) | None => None,
        Some(value) => Some((*key, value)),
    })
}

/// Coerces loosely-typed request bodies into [`RawInput`]
pub struct InputValidator {
    config: ValidationConfig,
}

impl InputValidator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    fn ranged(
        &self,
        field: &'static str,
        value: Option<f64>,
        range: (f64, f64),
    ) -> Result<Option<f64>, ValidationError> {
        if let Some(v) = value {
            self.validate_range(field, v, range)?;
        }
        Ok(value)
    }

    /// Coerce a JSON request body. Unknown keys are ignored.
    pub fn coerce(&self, body: &Value) -> Result<RawInput, ValidationError> {
        match body {
            Value::Object(map) => self.coerce_map(map),
            Value::Null => Ok(RawInput::default()),
            _ => Err(ValidationError::InvalidFormat(
                "request body must be a JSON object".to_string(),
            )),
        }
    }

    /// Coerce an already-parsed JSON object
    pub fn coerce_map(&self, map: &Map<String, Value>) -> Result<RawInput, ValidationError> {
        let c = &self.config;

        let field = |keys: &[&'static str]| lookup(map, keys);
        let number = |key: &'static str| match field(&[key]) {
            Some((name, value)) => coerce::number(name, value),
            None => Ok(None),
        };
        let count = |key: &'static str| match field(&[key]) {
            Some((name, value)) => coerce::count(name, value),
            None => Ok(None),
        };
        let flag = |keys: &[&'static str]| match field(keys) {
            Some((name, value)) => coerce::flag(name, value),
            None => Ok(None),
        };
        let label = |keys: &[&'static str]| match field(keys) {
            Some((name, value)) => coerce::label(name, value),
            None => Ok(None),
        };

        let raw = RawInput {
            funding_total: self.ranged("funding_total", number("funding_total")?, c.funding_total_range)?,
            funding_rounds: self.ranged("funding_rounds", count("funding_rounds")?, c.funding_rounds_range)?,
            startup_age: self.ranged("startup_age", number("startup_age")?, c.startup_age_range)?,
            milestones: self.ranged("milestones", count("milestones")?, c.milestones_range)?,
            relationships: self.ranged("relationships", count("relationships")?, c.relationships_range)?,
            avg_participants: self.ranged(
                "avg_participants",
                number("avg_participants")?,
                c.avg_participants_range,
            )?,
            has_vc: flag(&["has_vc", "has_VC"])?,
            has_angel: flag(&["has_angel"])?,
            has_round_a: flag(&["has_roundA", "has_series_a"])?,
            is_top500: flag(&["is_top500"])?,
            category: label(&["category"])?,
            state: label(&["state", "region"])?,
        };

        debug!("Coerced request with {} keys", map.len());
        Ok(raw)
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
