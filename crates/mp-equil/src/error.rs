//! Error types for equilibrium residual/Jacobian assembly.

use mp_model::ModelError;
use thiserror::Error;

/// Errors that can occur while building or evaluating an equilibrium system.
#[derive(Error, Debug)]
pub enum EquilibriumError {
    /// Mismatched sizes or counts detected once, at construction.
    #[error("Construction error: {what}")]
    Construction { what: String },

    /// A trial vector of the wrong length; the caller may correct and retry.
    #[error("Trial vector length mismatch: expected {expected}, got {actual}")]
    InputSize { expected: usize, actual: usize },

    /// A defect in the assembly itself, not a user error.
    #[error("Internal invariant violated: {what}")]
    Invariant { what: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type EquilibriumResult<T> = Result<T, EquilibriumError>;
