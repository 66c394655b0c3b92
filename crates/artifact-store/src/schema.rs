//! Ordered Feature Schema

use crate::ArtifactError;
use std::collections::HashMap;

/// Ordered, immutable list of the feature columns the classifier was trained on.
///
/// The name → slot lookup table is built once here so callers never scan
/// the list per field.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty lists and duplicate names
    pub fn new(names: Vec<String>) -> Result<Self, ArtifactError> {
        if names.is_empty() {
            return Err(ArtifactError::EmptySchema);
        }

        let mut index = HashMap::with_capacity(names.len());
        for (slot, name) in names.iter().enumerate() {
            if index.insert(name.clone(), slot).is_some() {
                return Err(ArtifactError::DuplicateFeature(name.clone()));
            }
        }

        Ok(Self { names, index })
    }

    /// Number of feature slots
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed schema
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Feature names in training order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Slot index of a column, if the schema has it
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// First of the candidate column names present in the schema
    pub fn first_of(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|name| self.index_of(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}
