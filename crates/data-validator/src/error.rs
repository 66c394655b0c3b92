//! Validation Error Types

use thiserror::Error;

/// Errors raised while coercing a request body
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Field present but not coercible to its expected type
    #[error("Invalid value for '{field}': {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Body is not a JSON object
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ValidationError {
    /// Offending field, when the error concerns one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidInput { field, .. } | ValidationError::OutOfRange { field, .. } => {
                Some(*field)
            }
            ValidationError::InvalidFormat(_) => None,
        }
    }
}
