//! Feature Reconstruction Engine
//!
//! Turns a partial, loosely-typed set of startup attributes into the
//! dense, schema-ordered feature vector the classifier was trained on,
//! including the derived and interaction features of training-time
//! feature engineering.

mod categorical;
mod derived;
mod features;
mod input;
mod reconstruct;

pub use categorical::{normalize_label, CategoricalBlock};
pub use features::{columns, FeatureVector};
pub use input::RawInput;
pub use reconstruct::{reconstruct, FeatureReconstructor, ReconstructionConfig};
