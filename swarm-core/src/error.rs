//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum SwarmError {
    /// The replay buffer has no transition to sample from.
    #[error("Insufficient data in replay buffer: requested {requested}, available {available}")]
    InsufficientData {
        /// The requested batch size.
        requested: usize,

        /// The number of transitions in the buffer.
        available: usize,
    },

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The length of a parameter vector does not match the model.
    #[error("Parameter length mismatch: expected {expected}, got {got}")]
    ParamLengthMismatch {
        /// Length expected by the model.
        expected: usize,

        /// Length of the given vector.
        got: usize,
    },

    /// The environment was used after [`Env::close`](crate::Env::close).
    #[error("Environment already closed")]
    EnvClosed,

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl SwarmError {
    /// Returns `true` if the given error is [`SwarmError::InsufficientData`].
    pub fn is_insufficient_data(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<SwarmError>(),
            Some(SwarmError::InsufficientData { .. })
        )
    }
}
