//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A persisted session record is missing one of a pair of fields that
    /// must be set together.
    #[error("partial session record: {0}")]
    PartialSession(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
