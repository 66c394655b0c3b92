//! Derived and Interaction Features
//!
//! Formulas mirror training-time feature engineering. A derived column is
//! written only when it and all of its inputs exist in the schema; inputs
//! are read back from the already populated slots.

use crate::features::columns;
use crate::reconstruct::InputSlots;
use artifact_store::FeatureSchema;

/// Startups younger than this are early stage (years)
const GROWTH_STAGE_MIN_AGE: f64 = 3.0;
/// Startups at least this old are mature (years)
const MATURE_STAGE_MIN_AGE: f64 = 7.0;
/// Relationship count that makes a strong network
const STRONG_NETWORK_MIN: f64 = 10.0;
const MULTIPLE_ROUNDS_MIN: f64 = 2.0;

/// Ratio with a non-positive denominator mapped to 0
pub(crate) fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let ratio = numerator / denominator;
        if ratio.is_finite() {
            return ratio;
        }
    }
    0.0
}

/// One-hot (early, growth, mature) for an age in years
pub(crate) fn age_stage(age: f64) -> [f64; 3] {
    if age < GROWTH_STAGE_MIN_AGE {
        [1.0, 0.0, 0.0]
    } else if age < MATURE_STAGE_MIN_AGE {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    }
}

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DerivedSlots {
    funding_per_round: Option<usize>,
    funding_velocity: Option<usize>,
    milestone_per_year: Option<usize>,
    relationships_per_year: Option<usize>,
    multiple_rounds: Option<usize>,
    has_both_vc_angel: Option<usize>,
    strong_network: Option<usize>,
    stages: Option<[usize; 3]>,
    in_major_hub: Option<usize>,
    is_tech: Option<usize>,
    hub_tech_combo: Option<usize>,
}

impl DerivedSlots {
    pub(crate) fn compile(schema: &FeatureSchema) -> Self {
        let stages = match (
            schema.index_of(columns::EARLY_STAGE),
            schema.index_of(columns::GROWTH_STAGE),
            schema.index_of(columns::MATURE_STAGE),
        ) {
            (Some(early), Some(growth), Some(mature)) => Some([early, growth, mature]),
            _ => None,
        };

        Self {
            funding_per_round: schema.index_of(columns::FUNDING_PER_ROUND),
            funding_velocity: schema.index_of(columns::FUNDING_VELOCITY),
            milestone_per_year: schema.index_of(columns::MILESTONE_PER_YEAR),
            relationships_per_year: schema.index_of(columns::RELATIONSHIPS_PER_YEAR),
            multiple_rounds: schema.index_of(columns::MULTIPLE_ROUNDS),
            has_both_vc_angel: schema.index_of(columns::HAS_BOTH_VC_ANGEL),
            strong_network: schema.index_of(columns::STRONG_NETWORK),
            stages,
            in_major_hub: schema.index_of(columns::IN_MAJOR_HUB),
            is_tech: schema.index_of(columns::IS_TECH),
            hub_tech_combo: schema.index_of(columns::HUB_TECH_COMBO),
        }
    }

    pub(crate) fn apply(
        &self,
        inputs: &InputSlots,
        values: &mut [f64],
        in_major_hub: bool,
        is_tech: bool,
    ) {
        let read = |slot: Option<usize>| slot.map(|i| values[i]);
        let funding_total = read(inputs.funding_total);
        let funding_rounds = read(inputs.funding_rounds);
        let startup_age = read(inputs.startup_age);
        let milestones = read(inputs.milestones);
        let relationships = read(inputs.relationships);
        let has_vc = read(inputs.has_vc);
        let has_angel = read(inputs.has_angel);

        let mut set = |slot: Option<usize>, value: Option<f64>| {
            if let (Some(slot), Some(value)) = (slot, value) {
                values[slot] = value;
            }
        };

        let ratio = |num: Option<f64>, den: Option<f64>| Some(safe_ratio(num?, den?));
        set(self.funding_per_round, ratio(funding_total, funding_rounds));
        set(self.funding_velocity, ratio(funding_total, startup_age));
        set(self.milestone_per_year, ratio(milestones, startup_age));
        set(self.relationships_per_year, ratio(relationships, startup_age));

        set(
            self.multiple_rounds,
            funding_rounds.map(|rounds| indicator(rounds >= MULTIPLE_ROUNDS_MIN)),
        );
        set(
            self.has_both_vc_angel,
            has_vc
                .zip(has_angel)
                .map(|(vc, angel)| indicator(vc == 1.0 && angel == 1.0)),
        );
        set(
            self.strong_network,
            relationships.map(|count| indicator(count >= STRONG_NETWORK_MIN)),
        );

        set(self.in_major_hub, Some(indicator(in_major_hub)));
        set(self.is_tech, Some(indicator(is_tech)));
        set(self.hub_tech_combo, Some(indicator(in_major_hub && is_tech)));

        if let (Some(slots), Some(age)) = (self.stages, startup_age) {
            for (slot, value) in slots.into_iter().zip(age_stage(age)) {
                values[slot] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio_guards_denominator() {
        assert_eq!(safe_ratio(10.0, 4.0), 2.5);
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(10.0, -1.0), 0.0);
        assert_eq!(safe_ratio(f64::MAX, f64::MIN_POSITIVE), 0.0);
    }

    #[test]
    fn test_age_stage_boundaries() {
        assert_eq!(age_stage(0.0), [1.0, 0.0, 0.0]);
        assert_eq!(age_stage(2.99), [1.0, 0.0, 0.0]);
        assert_eq!(age_stage(3.0), [0.0, 1.0, 0.0]);
        assert_eq!(age_stage(6.5), [0.0, 1.0, 0.0]);
        assert_eq!(age_stage(7.0), [0.0, 0.0, 1.0]);
        assert_eq!(age_stage(25.0), [0.0, 0.0, 1.0]);
    }
}
