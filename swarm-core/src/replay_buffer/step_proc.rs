//! N-step return accumulation.
use crate::{error::SwarmError, Transition};
use anyhow::Result;
use std::collections::VecDeque;

/// Turns a stream of environment steps into n-step [`Transition`]s.
///
/// The processor keeps a FIFO window of `(state, action, reward)` triples.
/// When the window holds `n_step` triples, the oldest one `(s0, a0, r0)` is
/// popped and emitted with the return
///
/// ```text
/// R = r0 + sum_{i=1..m} r_i * discount^i
/// ```
///
/// where `r_1..r_m` are the rewards still in the window after the pop.
/// Triples left in the window when an episode ends are discarded by
/// [`NStepProcessor::reset`], so partial returns are never emitted.
#[derive(Debug, Clone)]
pub struct NStepProcessor {
    n_step: usize,
    discount: f32,
    window: VecDeque<(Vec<f32>, Vec<f32>, f32)>,
}

impl NStepProcessor {
    /// Constructs a processor with horizon `n_step` and discount factor `discount`.
    pub fn new(n_step: usize, discount: f32) -> Result<Self> {
        if n_step == 0 {
            return Err(SwarmError::InvalidConfig("n_step must be at least 1".into()).into());
        }
        Ok(Self {
            n_step,
            discount,
            window: VecDeque::with_capacity(n_step),
        })
    }

    /// The horizon of the return.
    pub fn n_step(&self) -> usize {
        self.n_step
    }

    /// Number of steps waiting in the window.
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    /// Discards the pending window. Called at the start of every episode.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Processes the step `(state, action, reward) -> next_state`.
    ///
    /// Returns a transition once the window reaches the horizon. Its
    /// `next_state` is the state reached by this step and its continue mask
    /// is `0` iff `is_done`.
    pub fn process(
        &mut self,
        state: Vec<f32>,
        action: Vec<f32>,
        reward: f32,
        next_state: &[f32],
        is_done: bool,
    ) -> Option<Transition> {
        self.window.push_back((state, action, reward));

        if self.window.len() < self.n_step {
            return None;
        }

        let (s0, a0, mut discounted) = self.window.pop_front()?;
        for (i, (_, _, r)) in self.window.iter().enumerate() {
            discounted += r * self.discount.powi(i as i32 + 1);
        }

        Some(Transition::new(
            s0,
            a0,
            discounted,
            next_state.to_vec(),
            is_done,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn s(x: f32) -> Vec<f32> {
        vec![x]
    }

    #[test]
    fn test_three_step_return() {
        let gamma = 0.9f32;
        let (r0, r1, r2) = (1.5f32, -0.25f32, 2.0f32);
        let mut proc = NStepProcessor::new(3, gamma).unwrap();

        assert!(proc.process(s(0.), s(0.), r0, &s(1.), false).is_none());
        assert!(proc.process(s(1.), s(1.), r1, &s(2.), false).is_none());
        let tr = proc.process(s(2.), s(2.), r2, &s(3.), false).unwrap();

        assert_eq!(tr.state(), &[0.][..]);
        assert_eq!(tr.action(), &[0.][..]);
        assert_eq!(tr.next_state(), &[3.][..]);
        assert_eq!(tr.n_step_return(), r0 + r1 * gamma.powi(1) + r2 * gamma.powi(2));
        assert_eq!(tr.continue_mask(), 1);
        assert_eq!(proc.pending(), 2);
    }

    #[test]
    fn test_one_step_emits_immediately() {
        let mut proc = NStepProcessor::new(1, 0.99).unwrap();
        for i in 0..5 {
            let done = i == 4;
            let tr = proc
                .process(s(i as f32), s(0.), 1.0, &s(i as f32 + 1.), done)
                .unwrap();
            assert_eq!(tr.n_step_return(), 1.0);
            assert_eq!(tr.continue_mask(), if done { 0 } else { 1 });
        }
        assert_eq!(proc.pending(), 0);
    }

    #[test]
    fn test_mask_is_zero_only_when_window_closes_at_termination() {
        let mut proc = NStepProcessor::new(2, 0.5).unwrap();
        let mut emitted = vec![];
        for i in 0..4 {
            let done = i == 3;
            if let Some(tr) = proc.process(s(i as f32), s(0.), 1.0, &s(i as f32 + 1.), done) {
                emitted.push(tr);
            }
        }
        let masks: Vec<u8> = emitted.iter().map(|t| t.continue_mask()).collect();
        assert_eq!(masks, vec![1, 1, 0]);
        assert_eq!(emitted[2].state(), &[2.][..]);
        assert_eq!(emitted[2].n_step_return(), 1.0 + 1.0 * 0.5);
    }

    #[test]
    fn test_reset_discards_partial_window() {
        let mut proc = NStepProcessor::new(3, 0.9).unwrap();
        proc.process(s(0.), s(0.), 1.0, &s(1.), false);
        proc.process(s(1.), s(0.), 1.0, &s(2.), true);
        assert_eq!(proc.pending(), 2);

        proc.reset();
        assert_eq!(proc.pending(), 0);
        assert!(proc.process(s(10.), s(0.), 1.0, &s(11.), false).is_none());
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        assert!(NStepProcessor::new(0, 0.9).is_err());
    }
}
