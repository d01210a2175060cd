//! Errors reported by todo operations.

use crate::types::TodoId;
use thiserror::Error;
use todo_runtime::StoreError;

/// Why a todo operation did not take effect
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// Input was rejected, e.g. a blank title
    #[error("{0}")]
    Validation(String),

    /// No todo has the given id
    #[error("Todo with ID {0} not found")]
    NotFound(TodoId),

    /// Every id has been handed out, so nothing more can be created
    #[error("No todo ids left")]
    IdsExhausted,

    /// The store is not accepting commands
    #[error("Todo store unavailable: {0}")]
    Unavailable(String),

    /// The store broke one of its own invariants
    #[error("Internal todo store error: {0}")]
    Internal(String),
}

impl TodoError {
    /// True for rejected input
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True for an unknown id
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<StoreError> for TodoError {
    fn from(err: StoreError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
