//! Feature Vector Reconstruction

use crate::categorical::{normalize_label, CategoricalBlock, CompiledBlock};
use crate::derived::DerivedSlots;
use crate::features::{columns, FeatureVector};
use crate::input::RawInput;
use artifact_store::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Feature engineering settings shared with the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    pub category: CategoricalBlock,
    pub state: CategoricalBlock,
    /// States counted as a major startup hub
    pub hub_states: Vec<String>,
    /// Categories counted as tech
    pub tech_categories: Vec<String>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            category: CategoricalBlock::categories(),
            state: CategoricalBlock::states(),
            hub_states: vec!["CA".into(), "NY".into(), "MA".into()],
            tech_categories: vec![
                "software".into(),
                "web".into(),
                "mobile".into(),
                "enterprise".into(),
                "gamesvideo".into(),
                "ecommerce".into(),
            ],
        }
    }
}

/// Schema slots of the directly supplied inputs
#[derive(Debug, Clone, Default)]
pub(crate) struct InputSlots {
    pub funding_total: Option<usize>,
    pub funding_rounds: Option<usize>,
    pub startup_age: Option<usize>,
    pub milestones: Option<usize>,
    pub relationships: Option<usize>,
    pub avg_participants: Option<usize>,
    pub has_vc: Option<usize>,
    pub has_angel: Option<usize>,
    pub has_round_a: Option<usize>,
    pub is_top500: Option<usize>,
}

impl InputSlots {
    fn compile(schema: &FeatureSchema) -> Self {
        Self {
            funding_total: schema.first_of(columns::FUNDING_TOTAL),
            funding_rounds: schema.first_of(columns::FUNDING_ROUNDS),
            startup_age: schema.first_of(columns::STARTUP_AGE),
            milestones: schema.first_of(columns::MILESTONES),
            relationships: schema.first_of(columns::RELATIONSHIPS),
            avg_participants: schema.first_of(columns::AVG_PARTICIPANTS),
            has_vc: schema.first_of(columns::HAS_VC),
            has_angel: schema.first_of(columns::HAS_ANGEL),
            has_round_a: schema.first_of(columns::HAS_ROUND_A),
            is_top500: schema.first_of(columns::IS_TOP500),
        }
    }
}

/// Rebuilds full feature vectors for one schema.
///
/// All column lookups happen once in [`FeatureReconstructor::new`];
/// [`FeatureReconstructor::reconstruct`] only indexes into the vector.
#[derive(Debug, Clone)]
pub struct FeatureReconstructor {
    width: usize,
    inputs: InputSlots,
    derived: DerivedSlots,
    category: CompiledBlock,
    state: CompiledBlock,
    hub_states: HashSet<String>,
    tech_categories: HashSet<String>,
}

impl FeatureReconstructor {
    /// Compile the reconstruction plan for a schema
    pub fn new(schema: &FeatureSchema, config: &ReconstructionConfig) -> Self {
        let inputs = InputSlots::compile(schema);
        let mapped = [
            inputs.funding_total,
            inputs.funding_rounds,
            inputs.startup_age,
            inputs.milestones,
            inputs.relationships,
            inputs.avg_participants,
            inputs.has_vc,
            inputs.has_angel,
            inputs.has_round_a,
            inputs.is_top500,
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count();
        info!(
            "Feature reconstructor ready: {} features, {} direct inputs mapped",
            schema.len(),
            mapped
        );

        Self {
            width: schema.len(),
            inputs,
            derived: DerivedSlots::compile(schema),
            category: config.category.compile(schema),
            state: config.state.compile(schema),
            hub_states: config.hub_states.iter().map(|s| normalize_label(s)).collect(),
            tech_categories: config
                .tech_categories
                .iter()
                .map(|s| normalize_label(s))
                .collect(),
        }
    }

    /// Number of slots in the produced vectors
    pub fn width(&self) -> usize {
        self.width
    }

    /// Build the feature vector for one input.
    ///
    /// `defaults` seeds every slot (scaler means) when its length matches the
    /// schema; otherwise every slot starts at 0.0.
    pub fn reconstruct(&self, raw: &RawInput, defaults: &[f64]) -> FeatureVector {
        let mut values = if defaults.len() == self.width {
            defaults.iter().map(|v| finite_or_zero(*v)).collect()
        } else {
            vec![0.0; self.width]
        };

        let numeric = [
            (self.inputs.funding_total, raw.funding_total),
            (self.inputs.funding_rounds, raw.funding_rounds),
            (self.inputs.startup_age, raw.startup_age),
            (self.inputs.milestones, raw.milestones),
            (self.inputs.relationships, raw.relationships),
            (self.inputs.avg_participants, raw.avg_participants),
        ];
        for (slot, value) in numeric {
            if let (Some(slot), Some(value)) = (slot, value) {
                values[slot] = finite_or_zero(value);
            }
        }

        let flags = [
            (self.inputs.has_vc, raw.has_vc),
            (self.inputs.has_angel, raw.has_angel),
            (self.inputs.has_round_a, raw.has_round_a),
            (self.inputs.is_top500, raw.is_top500),
        ];
        for (slot, flag) in flags {
            if let Some(slot) = slot {
                values[slot] = if flag.unwrap_or(false) { 1.0 } else { 0.0 };
            }
        }

        let category = self.category.resolve(raw.category.as_deref());
        let state = self.state.resolve(raw.state.as_deref());
        self.category.encode(&mut values, category);
        self.state.encode(&mut values, state);

        let in_major_hub = state.map_or(false, |s| self.hub_states.contains(&normalize_label(s)));
        let is_tech =
            category.map_or(false, |c| self.tech_categories.contains(&normalize_label(c)));

        self.derived
            .apply(&self.inputs, &mut values, in_major_hub, is_tech);

        for value in values.iter_mut() {
            *value = finite_or_zero(*value);
        }

        debug!(
            "Reconstructed {} features (category={:?}, state={:?}, hub={}, tech={})",
            values.len(),
            category,
            state,
            in_major_hub,
            is_tech
        );

        FeatureVector {
            values,
            category: category.map(str::to_string),
            state: state.map(str::to_string),
            in_major_hub,
            is_tech,
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// One-shot reconstruction with the default feature engineering settings
pub fn reconstruct(raw: &RawInput, schema: &FeatureSchema, defaults: &[f64]) -> FeatureVector {
    FeatureReconstructor::new(schema, &ReconstructionConfig::default()).reconstruct(raw, defaults)
}
