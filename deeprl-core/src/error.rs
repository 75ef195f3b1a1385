//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum DeeprlError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The numeric type of observations is not supported by the agent.
    #[error("Unsupported precision: {0}")]
    UnsupportedPrecision(String),

    /// Dimensions of data disagree with the ones given at construction.
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Where the mismatch was detected.
        context: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// A replay buffer does not hold enough transitions for the requested batch.
    #[error("Not enough data in the replay buffer: requested {requested}, available {available}")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,
        /// Number of transitions in the buffer.
        available: usize,
    },

    /// A step processor received a step before being reset.
    #[error("Step processor is not reset; call reset() with the initial observation first")]
    StepProcessorNotReset,
}
