//! Small environments and a linear policy, used in tests and by the `swarm` binary.
use crate::{
    error::SwarmError,
    record::{Record, RecordValue},
    Env, Model, Policy, Step, TransitionBatch,
};
use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// Configuration of [`CountdownEnv`].
#[derive(Clone, Debug)]
pub struct CountdownEnvConfig {
    /// Every episode terminates after exactly this many steps.
    pub episode_len: usize,

    /// Dimension of the state vector.
    pub state_dim: usize,

    /// Sleep inserted in every step.
    pub step_delay: Duration,

    /// Step index (0-based) at which an injected failure happens.
    pub fail_at_step: usize,

    /// Number of failures still to inject, shared by all instances.
    pub failures: Arc<AtomicUsize>,

    /// Number of environments built with this configuration.
    pub n_built: Arc<AtomicUsize>,

    /// Number of calls to [`Env::close`] on environments built with this configuration.
    pub n_closed: Arc<AtomicUsize>,
}

impl Default for CountdownEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 5,
            state_dim: 1,
            step_delay: Duration::from_millis(0),
            fail_at_step: 0,
            failures: Arc::new(AtomicUsize::new(0)),
            n_built: Arc::new(AtomicUsize::new(0)),
            n_closed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CountdownEnvConfig {
    /// Sets the episode length.
    pub fn episode_len(mut self, v: usize) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets the state dimension.
    pub fn state_dim(mut self, v: usize) -> Self {
        self.state_dim = v;
        self
    }

    /// Sets the delay of every step.
    pub fn step_delay(mut self, v: Duration) -> Self {
        self.step_delay = v;
        self
    }

    /// Makes the next `n` episodes reaching step `step` fail there.
    pub fn inject_failures(mut self, step: usize, n: usize) -> Self {
        self.fail_at_step = step;
        self.failures = Arc::new(AtomicUsize::new(n));
        self
    }
}

/// A deterministic environment: reward `1` on every step, termination after
/// exactly `episode_len` steps.
///
/// Every element of the state is the number of steps taken in the episode.
pub struct CountdownEnv {
    config: CountdownEnvConfig,
    t: usize,
}

impl CountdownEnv {
    fn state(&self) -> Vec<f32> {
        vec![self.t as f32; self.config.state_dim]
    }
}

impl Env for CountdownEnv {
    type Config = CountdownEnvConfig;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        config.n_built.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            config: config.clone(),
            t: 0,
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.t = 0;
        Ok(self.state())
    }

    fn step(&mut self, _act: &[f32]) -> Result<Step> {
        if !self.config.step_delay.is_zero() {
            thread::sleep(self.config.step_delay);
        }
        if self.t == self.config.fail_at_step {
            let failures = &self.config.failures;
            let injected = failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if injected {
                bail!("Injected failure at step {}", self.t);
            }
        }
        self.t += 1;
        let is_done = self.t >= self.config.episode_len;
        Ok(Step::new(self.state(), 1.0, is_done))
    }

    fn close(&mut self) {
        self.config.n_closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Configuration of [`PointMassEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PointMassEnvConfig {
    /// Integration time step.
    pub dt: f32,

    /// Initial positions are drawn uniformly from `[-init_range, init_range]`.
    pub init_range: f32,

    /// The episode terminates when `|x|` exceeds this bound.
    pub x_limit: f32,
}

impl Default for PointMassEnvConfig {
    fn default() -> Self {
        Self {
            dt: 0.05,
            init_range: 1.0,
            x_limit: 5.0,
        }
    }
}

/// A 1-D point mass pushed by a force; the goal is to stay at the origin.
///
/// State `[x, v]`, action `[force]`, reward `-|x|`.
pub struct PointMassEnv {
    config: PointMassEnvConfig,
    rng: StdRng,
    x: f32,
    v: f32,
}

impl Env for PointMassEnv {
    type Config = PointMassEnvConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(seed as u64),
            x: 0.0,
            v: 0.0,
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        let r = self.config.init_range;
        self.x = if r > 0.0 { self.rng.gen_range(-r..r) } else { 0.0 };
        self.v = 0.0;
        Ok(vec![self.x, self.v])
    }

    fn step(&mut self, act: &[f32]) -> Result<Step> {
        let force = *act.first().ok_or(SwarmError::ParamLengthMismatch {
            expected: 1,
            got: 0,
        })?;
        self.v += force * self.config.dt;
        self.x += self.v * self.config.dt;
        let is_done = self.x.abs() > self.config.x_limit;
        Ok(Step::new(vec![self.x, self.v], -self.x.abs(), is_done))
    }

    fn close(&mut self) {}
}

/// Configuration of [`LinearPolicy`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LinearPolicyConfig {
    /// Dimension of the state.
    pub state_dim: usize,

    /// Dimension of the action.
    pub action_dim: usize,

    /// Step size of the training step.
    pub learning_rate: f32,

    /// Initial weights are drawn uniformly from `[-init_scale, init_scale]`.
    pub init_scale: f32,

    /// Seed of the weight initialization.
    pub seed: u64,
}

impl Default for LinearPolicyConfig {
    fn default() -> Self {
        Self {
            state_dim: 2,
            action_dim: 1,
            learning_rate: 0.01,
            init_scale: 0.1,
            seed: 42,
        }
    }
}

/// Deterministic policy `a = tanh(W s + b)`.
///
/// Parameters are laid out as `W` in row-major order followed by `b`.
/// The training step is an advantage-weighted regression of the output
/// toward the actions in the batch, with the batch mean return as baseline.
#[derive(Clone, Debug)]
pub struct LinearPolicy {
    state_dim: usize,
    action_dim: usize,
    learning_rate: f32,
    params: Vec<f32>,
}

impl LinearPolicy {
    fn n_params(&self) -> usize {
        self.action_dim * (self.state_dim + 1)
    }

    fn bias(&self, j: usize) -> f32 {
        self.params[self.action_dim * self.state_dim + j]
    }

    fn weight(&self, j: usize, k: usize) -> f32 {
        self.params[j * self.state_dim + k]
    }
}

impl Policy for LinearPolicy {
    fn infer_action(&self, state: &[f32]) -> Vec<f32> {
        (0..self.action_dim)
            .map(|j| {
                let pre = state
                    .iter()
                    .take(self.state_dim)
                    .enumerate()
                    .fold(self.bias(j), |acc, (k, s)| acc + self.weight(j, k) * s);
                pre.tanh()
            })
            .collect()
    }
}

impl Model for LinearPolicy {
    type Config = LinearPolicyConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        if config.state_dim == 0 || config.action_dim == 0 {
            return Err(SwarmError::InvalidConfig("dimensions must be positive".into()).into());
        }
        let mut rng = StdRng::seed_from_u64(config.seed);
        let n = config.action_dim * (config.state_dim + 1);
        let s = config.init_scale;
        let params = (0..n)
            .map(|_| if s > 0.0 { rng.gen_range(-s..s) } else { 0.0 })
            .collect();
        Ok(Self {
            state_dim: config.state_dim,
            action_dim: config.action_dim,
            learning_rate: config.learning_rate,
            params,
        })
    }

    fn params(&self) -> Vec<f32> {
        self.params.clone()
    }

    fn apply_params(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.n_params() {
            return Err(SwarmError::ParamLengthMismatch {
                expected: self.n_params(),
                got: params.len(),
            }
            .into());
        }
        self.params.copy_from_slice(params);
        Ok(())
    }

    fn train_step(&mut self, batch: &TransitionBatch) -> Result<Record> {
        if batch.is_empty() {
            return Ok(Record::empty());
        }
        let n = batch.len() as f32;
        let returns = batch.returns();
        let baseline = returns.iter().sum::<f32>() / n;

        let mut grad = vec![0f32; self.n_params()];
        let mut loss = 0f32;
        for (tr, ret) in batch.iter().zip(returns.iter()) {
            let adv = ret - baseline;
            let y = self.infer_action(tr.state());
            for j in 0..self.action_dim {
                let target = tr.action().get(j).copied().unwrap_or(0.0);
                let err = target - y[j];
                loss += adv.abs() * err * err;
                let g = adv * err * (1.0 - y[j] * y[j]);
                for (k, s) in tr.state().iter().take(self.state_dim).enumerate() {
                    grad[j * self.state_dim + k] += g * s;
                }
                grad[self.action_dim * self.state_dim + j] += g;
            }
        }
        for (p, g) in self.params.iter_mut().zip(grad.iter()) {
            *p += self.learning_rate * g / n;
        }

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss / n)),
            ("mean_return", RecordValue::Scalar(baseline)),
        ]))
    }
}
