//! Transitions and batches of transitions.
use std::sync::Arc;

/// One training sample `(s_t, a_t, R_t, s_t+n, mask)`.
///
/// `n_step_return` is the discounted sum of the rewards observed in the
/// n-step window. `continue_mask` is `0` if the episode terminated inside the
/// window, `1` otherwise. A transition is immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    state: Vec<f32>,
    action: Vec<f32>,
    n_step_return: f32,
    next_state: Vec<f32>,
    continue_mask: u8,
}

impl Transition {
    /// Constructs a transition.
    ///
    /// `is_done` is the termination flag at the time the window closed.
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        n_step_return: f32,
        next_state: Vec<f32>,
        is_done: bool,
    ) -> Self {
        Self {
            state,
            action,
            n_step_return,
            next_state,
            continue_mask: if is_done { 0 } else { 1 },
        }
    }

    /// State at the start of the window.
    pub fn state(&self) -> &[f32] {
        &self.state
    }

    /// Action taken in [`Transition::state`].
    pub fn action(&self) -> &[f32] {
        &self.action
    }

    /// Discounted return over the window.
    pub fn n_step_return(&self) -> f32 {
        self.n_step_return
    }

    /// State reached when the window closed.
    pub fn next_state(&self) -> &[f32] {
        &self.next_state
    }

    /// `0` if the episode terminated within the window, `1` otherwise.
    pub fn continue_mask(&self) -> u8 {
        self.continue_mask
    }
}

/// A batch of transitions sampled from a replay buffer.
///
/// Transitions are shared with the buffer, not copied.
#[derive(Debug, Clone, Default)]
pub struct TransitionBatch {
    transitions: Vec<Arc<Transition>>,
}

impl TransitionBatch {
    /// Wraps sampled transitions.
    pub fn new(transitions: Vec<Arc<Transition>>) -> Self {
        Self { transitions }
    }

    /// The number of samples.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the batch holds no sample.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Iterates over the samples.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().map(|t| t.as_ref())
    }

    /// Returns the shared samples.
    pub fn transitions(&self) -> &[Arc<Transition>] {
        &self.transitions
    }

    /// `s_t` of each sample.
    pub fn states(&self) -> Vec<&[f32]> {
        self.iter().map(|t| t.state()).collect()
    }

    /// `a_t` of each sample.
    pub fn actions(&self) -> Vec<&[f32]> {
        self.iter().map(|t| t.action()).collect()
    }

    /// `R_t` of each sample.
    pub fn returns(&self) -> Vec<f32> {
        self.iter().map(|t| t.n_step_return()).collect()
    }

    /// `s_t+n` of each sample.
    pub fn next_states(&self) -> Vec<&[f32]> {
        self.iter().map(|t| t.next_state()).collect()
    }

    /// Continue masks of each sample.
    pub fn continue_masks(&self) -> Vec<u8> {
        self.iter().map(|t| t.continue_mask()).collect()
    }
}
