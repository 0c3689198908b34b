//! Stack-related error types.

use thiserror::Error;

/// Errors that can occur while resolving a configuration or building a stack.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("no such activation: {name}")]
    NoSuchActivation { name: String },

    #[error("no such normalization: {name}")]
    NoSuchNorm { name: String },

    #[error("no such initializer: {name}")]
    NoSuchInitializer { name: String },

    #[error("stack input must have at least one feature")]
    NoInputFeatures,

    #[error("fc_size must be positive")]
    InvalidFcSize,

    #[error("dropout rate must be in [0, 1), got {rate}")]
    InvalidDropoutRate { rate: f64 },

    #[error(
        "weight shape mismatch: expected [{expected_in}, {expected_out}], got [{actual_in}, {actual_out}]"
    )]
    WeightShapeMismatch {
        expected_in: usize,
        expected_out: usize,
        actual_in: usize,
        actual_out: usize,
    },

    #[error("bias shape mismatch: expected [{expected}], got [{actual}]")]
    BiasShapeMismatch { expected: usize, actual: usize },
}
