use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use swarm_core::{error::SwarmError, EpisodeSchedule};

/// Configuration of [`Actor`](crate::Actor).
///
/// Fields of the [`EpisodeSchedule`] appear at the top level in YAML.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ActorConfig {
    /// Horizon of the n-step return.
    pub n_step: usize,

    /// Discount factor.
    pub discount: f32,

    /// Step cap and exploration noise per episode.
    #[serde(flatten)]
    pub schedule: EpisodeSchedule,

    /// Number of episodes each actor runs before exiting.
    pub max_episodes: usize,

    /// Number of completed episodes between two parameter refreshes.
    pub refresh_interval: usize,

    /// Lower bound for clipping raw actions.
    pub action_low: f32,

    /// Upper bound for clipping raw actions.
    pub action_high: f32,

    /// Base random seed. Actor `i` uses `seed + i`.
    pub seed: u64,

    /// If `false`, only actor 0 writes episode metrics.
    pub record_all_workers: bool,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            n_step: 3,
            discount: 0.99,
            schedule: EpisodeSchedule::default(),
            max_episodes: 1000,
            refresh_interval: 1,
            action_low: -1.0,
            action_high: 1.0,
            seed: 42,
            record_all_workers: false,
        }
    }
}

impl ActorConfig {
    /// Constructs [ActorConfig] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [ActorConfig].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Checks the constraints between fields.
    pub fn validate(&self) -> Result<()> {
        let msg = if self.n_step == 0 {
            "n_step must be at least 1"
        } else if self.refresh_interval == 0 {
            "refresh_interval must be at least 1"
        } else if self.schedule.noise_decay_block == 0 {
            "noise_decay_block must be at least 1"
        } else if self.action_low > self.action_high {
            "action_low must not exceed action_high"
        } else {
            return Ok(());
        };
        Err(SwarmError::InvalidConfig(msg.into()).into())
    }

    /// Sets the horizon of the n-step return.
    pub fn n_step(mut self, v: usize) -> Self {
        self.n_step = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount(mut self, v: f32) -> Self {
        self.discount = v;
        self
    }

    /// Sets the episode schedule.
    pub fn schedule(mut self, v: EpisodeSchedule) -> Self {
        self.schedule = v;
        self
    }

    /// Sets the number of episodes per actor.
    pub fn max_episodes(mut self, v: usize) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the refresh interval in episodes.
    pub fn refresh_interval(mut self, v: usize) -> Self {
        self.refresh_interval = v;
        self
    }

    /// Sets the clipping bounds of actions.
    pub fn action_bounds(mut self, low: f32, high: f32) -> Self {
        self.action_low = low;
        self.action_high = high;
        self
    }

    /// Sets the base random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets whether every actor writes episode metrics.
    pub fn record_all_workers(mut self, v: bool) -> Self {
        self.record_all_workers = v;
        self
    }
}
