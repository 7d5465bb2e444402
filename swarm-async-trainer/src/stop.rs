//! Cooperative stop signal and shared progress counters.
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Condvar, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

/// A process-wide stop flag that threads can poll or block on.
///
/// Once raised it stays raised. Actors poll it at step and episode
/// boundaries, the learner waits on it while the replay buffer warms up.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    /// Creates a signal that is not raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal and wakes every waiting thread.
    pub fn raise(&self) {
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        *raised = true;
        self.cond.notify_all();
    }

    /// Returns `true` if the signal has been raised.
    pub fn is_raised(&self) -> bool {
        *self.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the signal is raised.
    pub fn wait(&self) {
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        while !*raised {
            raised = self
                .cond
                .wait(raised)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until the signal is raised or `timeout` elapses.
    ///
    /// Returns `true` if the signal is raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        while !*raised {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            raised = self
                .cond
                .wait_timeout(raised, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *raised
    }
}

/// Counters shared by all actors.
#[derive(Debug, Default)]
pub struct Progress {
    episodes: AtomicUsize,
    env_steps: AtomicUsize,
    transitions: AtomicUsize,
}

impl Progress {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed episodes over all actors.
    pub fn episodes(&self) -> usize {
        self.episodes.load(Ordering::Acquire)
    }

    /// Environment steps over all actors.
    pub fn env_steps(&self) -> usize {
        self.env_steps.load(Ordering::Acquire)
    }

    /// Transitions pushed into the replay buffer over all actors.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::Acquire)
    }

    pub(crate) fn add_episode(&self) -> usize {
        self.episodes.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn add_env_step(&self) {
        self.env_steps.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn add_transition(&self) {
        self.transitions.fetch_add(1, Ordering::AcqRel);
    }
}
