//! Request Validation and Coercion
//!
//! Turns loosely-typed JSON request bodies into the strongly-typed input of
//! the feature reconstructor, rejecting values that cannot be coerced.

mod coerce;
mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{InputValidator, ValidationConfig};
