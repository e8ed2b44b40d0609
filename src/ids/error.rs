//! Allocator error types.
//!
//! Store-specific failures collapse into `StoreUnavailable` at the
//! `CounterStore` boundary so callers only see allocator outcomes.

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unknown sequence name: {0}")]
    InvalidSequenceName(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Counter value out of range: {0}")]
    ValueOutOfRange(String),
}

impl From<DatabaseError> for IdError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::ConstraintViolation(reason) => IdError::ValueOutOfRange(reason),
            other => IdError::StoreUnavailable(other.to_string()),
        }
    }
}
