//! Feature Vector and Column Names

use artifact_store::FeatureSchema;
use serde::{Deserialize, Serialize};

/// Column names of the training-time feature engineering.
///
/// Inputs list candidate spellings; the first present in the schema wins.
pub mod columns {
    pub const FUNDING_TOTAL: &[&str] = &["funding_total_usd", "funding_total"];
    pub const FUNDING_ROUNDS: &[&str] = &["funding_rounds"];
    pub const STARTUP_AGE: &[&str] = &["startup_age"];
    pub const MILESTONES: &[&str] = &["milestones"];
    pub const RELATIONSHIPS: &[&str] = &["relationships"];
    pub const AVG_PARTICIPANTS: &[&str] = &["avg_participants"];

    pub const HAS_VC: &[&str] = &["has_VC", "has_vc"];
    pub const HAS_ANGEL: &[&str] = &["has_angel"];
    pub const HAS_ROUND_A: &[&str] = &["has_roundA", "has_series_a"];
    pub const IS_TOP500: &[&str] = &["is_top500"];

    pub const FUNDING_PER_ROUND: &str = "funding_per_round";
    pub const FUNDING_VELOCITY: &str = "funding_velocity";
    pub const MILESTONE_PER_YEAR: &str = "milestone_per_year";
    pub const RELATIONSHIPS_PER_YEAR: &str = "relationships_per_year";
    pub const MULTIPLE_ROUNDS: &str = "multiple_rounds";
    pub const HAS_BOTH_VC_ANGEL: &str = "has_both_vc_angel";
    pub const STRONG_NETWORK: &str = "strong_network";
    pub const EARLY_STAGE: &str = "early_stage";
    pub const GROWTH_STAGE: &str = "growth_stage";
    pub const MATURE_STAGE: &str = "mature_stage";
    pub const IN_MAJOR_HUB: &str = "in_major_hub";
    pub const IS_TECH: &str = "is_tech";
    pub const HUB_TECH_COMBO: &str = "hub_tech_combo";
}

/// Dense feature vector aligned 1:1 with the feature schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature values in schema order
    pub values: Vec<f64>,

    // Resolved indicators for easy access, whether or not the schema has columns for them
    /// Resolved category, `None` when it fell into the fallback bucket
    pub category: Option<String>,
    /// Resolved state, `None` when it fell into the fallback bucket
    pub state: Option<String>,
    pub in_major_hub: bool,
    pub is_tech: bool,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Value of a named column
    pub fn get(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema
            .index_of(name)
            .and_then(|slot| self.values.get(slot).copied())
    }

    pub fn hub_tech_combo(&self) -> bool {
        self.in_major_hub && self.is_tech
    }
}
