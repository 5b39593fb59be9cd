//! Domain error model.

use thiserror::Error;

/// Result type used across the engine.
pub type DomainResult<T> = Result<T, DomainError>;

/// Engine-level error.
///
/// Read paths never surface these for missing references (a dangling grant
/// simply contributes nothing); they exist for administrative operations and
/// for callers that look up a single record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A candidate change failed a structural or uniqueness check.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record is absent from the snapshot.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A conflicting record already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The principal is not allowed to perform the operation.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the error is a missing-reference error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
