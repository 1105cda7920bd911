//! Error types for property model evaluation.

use thiserror::Error;

/// Errors that can occur while evaluating a property model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Non-physical state: {what}")]
    NonPhysical { what: String },
}

pub type ModelResult<T> = Result<T, ModelError>;
