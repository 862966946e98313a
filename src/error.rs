//! Typed errors for the normalization core.
//!
//! Unmatched phrases are never errors; they accumulate in
//! [`NormalizedResult::unmatched`](crate::models::NormalizedResult).
//! The variants here abort the current call.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PantryError {
    /// An exact vocabulary hit that no catalog entry owns. The vocabulary
    /// and the catalog were built from different data.
    #[error("vocabulary term '{term}' has no owning catalog entry")]
    Integrity { term: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("ingredient already exists: {0}")]
    DuplicateIngredient(String),
}
