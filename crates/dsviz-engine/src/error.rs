//! Error types for dsviz-engine.

use thiserror::Error;

use crate::engine::StructureKind;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Input was empty or whitespace only
    #[error("blank input")]
    Blank,

    /// A numeric structure received something that is not a signed integer
    #[error("not a number: {0:?}")]
    NotANumber(String),
}

/// Reasons an engine declined a command.
///
/// None of these change engine state. The command layer reports every
/// variant as a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The input did not validate
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Ordered structures keep values unique
    #[error("duplicate value {0} rejected")]
    Duplicate(i64),

    /// Pop/dequeue on an empty structure
    #[error("structure is empty")]
    Empty,

    /// The structure has no such operation
    #[error("{kind} does not support {op}")]
    Unsupported {
        kind: StructureKind,
        op: &'static str,
    },
}
