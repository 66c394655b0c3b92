//! Categorical One-Hot Blocks

use artifact_store::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Canonical comparison key for categorical values.
///
/// Lower-cases and drops everything that is not alphanumeric, so
/// "Game's Video", "games_video" and "GAMESVIDEO" compare equal.
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// One-hot encoded categorical variable as laid out in the schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalBlock {
    /// Column name prefix, e.g. `is_` for `is_software`
    pub column_prefix: String,
    /// Known values, spelled as in their column names
    pub values: Vec<String>,
    /// Column that receives values not in `values`
    pub fallback_column: String,
    /// Alternative spellings → known value
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl CategoricalBlock {
    /// Startup category block of the training data
    pub fn categories() -> Self {
        let values = [
            "software",
            "web",
            "mobile",
            "enterprise",
            "advertising",
            "gamesvideo",
            "ecommerce",
            "biotech",
            "consulting",
        ];
        let aliases = [
            ("games", "gamesvideo"),
            ("videogames", "gamesvideo"),
            ("gaming", "gamesvideo"),
            ("ads", "advertising"),
            ("adtech", "advertising"),
            ("biotechnology", "biotech"),
            ("saas", "software"),
        ];
        Self {
            column_prefix: "is_".to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
            fallback_column: "is_othercategory".to_string(),
            aliases: aliases
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Headquarters state block of the training data
    pub fn states() -> Self {
        let aliases = [
            ("california", "CA"),
            ("newyork", "NY"),
            ("massachusetts", "MA"),
            ("texas", "TX"),
        ];
        Self {
            column_prefix: "is_".to_string(),
            values: ["CA", "NY", "MA", "TX"].iter().map(|v| v.to_string()).collect(),
            fallback_column: "is_otherstate".to_string(),
            aliases: aliases
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Resolve the block against a schema once
    pub(crate) fn compile(&self, schema: &FeatureSchema) -> CompiledBlock {
        let known: Vec<(String, Option<usize>)> = self
            .values
            .iter()
            .map(|value| {
                let column = format!("{}{}", self.column_prefix, value);
                (value.clone(), schema.index_of(&column))
            })
            .collect();

        let mut lookup = HashMap::new();
        for (position, value) in self.values.iter().enumerate() {
            lookup.entry(normalize_label(value)).or_insert(position);
        }
        for (alias, target) in &self.aliases {
            let target = normalize_label(target);
            if let Some(position) = self.values.iter().position(|v| normalize_label(v) == target) {
                lookup.entry(normalize_label(alias)).or_insert(position);
            }
        }

        CompiledBlock {
            known,
            lookup,
            fallback: schema.index_of(&self.fallback_column),
        }
    }
}

/// Block with its schema slots looked up
#[derive(Debug, Clone)]
pub(crate) struct CompiledBlock {
    /// Known value and its slot, if the schema has the column
    known: Vec<(String, Option<usize>)>,
    /// Normalized spelling → position in `known`
    lookup: HashMap<String, usize>,
    fallback: Option<usize>,
}

impl CompiledBlock {
    /// Known value matching `raw`, if any
    pub(crate) fn resolve(&self, raw: Option<&str>) -> Option<&str> {
        let key = normalize_label(raw?);
        if key.is_empty() {
            return None;
        }
        self.lookup
            .get(&key)
            .map(|&position| self.known[position].0.as_str())
    }

    /// Zero the block, then hot exactly one column: the matched value's
    /// column when the schema has it, otherwise the fallback column.
    pub(crate) fn encode(&self, values: &mut [f64], resolved: Option<&str>) {
        for slot in self.known.iter().filter_map(|(_, slot)| *slot) {
            values[slot] = 0.0;
        }
        if let Some(slot) = self.fallback {
            values[slot] = 0.0;
        }

        let matched = resolved.and_then(|value| {
            self.known
                .iter()
                .find(|(known, _)| known == value)
                .and_then(|(_, slot)| *slot)
        });
        if let Some(slot) = matched.or(self.fallback) {
            values[slot] = 1.0;
        }
    }
}
