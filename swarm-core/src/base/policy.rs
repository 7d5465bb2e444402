//! Policy and trainable model.
use crate::{record::Record, TransitionBatch};
use anyhow::Result;

/// A policy on an environment.
///
/// Policy is a deterministic mapping from a state to a raw action.
/// Exploration noise and clipping are applied by the caller.
pub trait Policy {
    /// Infers an action given a state.
    fn infer_action(&self, state: &[f32]) -> Vec<f32>;
}

/// A policy whose parameters can be read, replaced and trained.
///
/// The parameters are exchanged as a flat vector of `f32`. The core never
/// looks inside it; it only moves whole vectors between the learner and the
/// actors.
pub trait Model: Policy {
    /// Configuration.
    type Config: Clone;

    /// Builds the model.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Returns a copy of the current parameters.
    fn params(&self) -> Vec<f32>;

    /// Overwrites all parameters at once.
    fn apply_params(&mut self, params: &[f32]) -> Result<()>;

    /// Performs an optimization step on a batch and returns training metrics.
    fn train_step(&mut self, batch: &TransitionBatch) -> Result<Record>;
}
