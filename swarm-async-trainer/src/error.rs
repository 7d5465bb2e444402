//! Errors of the asynchronous trainer.
use thiserror::Error;

/// Errors of the asynchronous trainer.
#[derive(Error, Debug)]
pub enum AsyncTrainerError {
    /// A thread for an actor or the learner could not be spawned.
    #[error("Failed to spawn {0}")]
    SpawnUnit(String),

    /// A thread for an actor or the learner panicked.
    #[error("{0} panicked")]
    UnitPanicked(String),
}
