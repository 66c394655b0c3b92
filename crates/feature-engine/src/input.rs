//! Typed Request Input

use serde::{Deserialize, Serialize};

/// Startup attributes supplied by a caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// Total funding raised (USD)
    pub funding_total: Option<f64>,
    pub funding_rounds: Option<f64>,
    /// Age of the startup in years
    pub startup_age: Option<f64>,
    pub milestones: Option<f64>,
    pub relationships: Option<f64>,
    pub avg_participants: Option<f64>,

    pub has_vc: Option<bool>,
    pub has_angel: Option<bool>,
    /// Raised a series A round (`has_roundA` / `has_series_a` on the wire)
    pub has_round_a: Option<bool>,
    pub is_top500: Option<bool>,

    pub category: Option<String>,
    /// US state code or name (`state` / `region` on the wire)
    pub state: Option<String>,
}
