//! Engine error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Dataset-mode as-of resolution needs at least one row to take the
    /// maximum purchase date from.
    #[error("cannot resolve dataset as-of date from an empty input table")]
    EmptyInput,

    /// Quantile benchmark lookup for a group with no benchmark row.
    /// Only the single-group path raises this; the all-groups path masks
    /// missing benchmarks with a fallback instead.
    #[error("no benchmark row for product group: {0}")]
    UnknownProductGroup(String),

    /// A control parameter was rejected before any computation ran.
    #[error("invalid parameter {param}: {reason}")]
    InvalidParameter { param: &'static str, reason: String },
}

impl EngineError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            param,
            reason: reason.into(),
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
