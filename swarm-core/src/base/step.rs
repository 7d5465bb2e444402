//! Environment step.

/// The outcome of a single environment step.
///
/// An environment emits a [`Step`] for every action it receives.
#[derive(Debug, Clone)]
pub struct Step {
    /// State reached after applying the action.
    pub next_state: Vec<f32>,

    /// Reward of the step.
    pub reward: f32,

    /// Flag denoting if the episode is terminated.
    pub is_done: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(next_state: Vec<f32>, reward: f32, is_done: bool) -> Self {
        Self {
            next_state,
            reward,
            is_done,
        }
    }
}
