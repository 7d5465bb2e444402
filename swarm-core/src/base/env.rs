//! Environment.
use super::Step;
use crate::error::SwarmError;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// An instance is built inside the thread of exactly one actor and never
/// leaves it, so it does not need to be [`Send`].
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Starts a new episode and returns its initial state.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Performs an environment step.
    fn step(&mut self, act: &[f32]) -> Result<Step>;

    /// Releases resources held by the environment.
    fn close(&mut self);
}

/// Owns an environment and closes it exactly once.
///
/// [`EnvGuard::close`] is idempotent and is also called on drop, so every
/// exit path of an actor, including unwinding, releases the environment.
pub struct EnvGuard<E: Env> {
    env: E,
    closed: bool,
}

impl<E: Env> EnvGuard<E> {
    /// Wraps an environment.
    pub fn new(env: E) -> Self {
        Self { env, closed: false }
    }

    /// Builds an environment and wraps it.
    pub fn build(config: &E::Config, seed: i64) -> Result<Self> {
        Ok(Self::new(E::build(config, seed)?))
    }

    /// Resets the wrapped environment.
    pub fn reset(&mut self) -> Result<Vec<f32>> {
        if self.closed {
            return Err(SwarmError::EnvClosed.into());
        }
        self.env.reset()
    }

    /// Steps the wrapped environment.
    pub fn step(&mut self, act: &[f32]) -> Result<Step> {
        if self.closed {
            return Err(SwarmError::EnvClosed.into());
        }
        self.env.step(act)
    }

    /// Closes the wrapped environment if it is still open.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.env.close();
        }
    }
}

impl<E: Env> Drop for EnvGuard<E> {
    fn drop(&mut self) {
        self.close();
    }
}
