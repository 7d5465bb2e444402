use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
    time::Duration,
};
use swarm_core::error::SwarmError;

/// Configuration of [`AsyncTrainer`](crate::AsyncTrainer).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AsyncTrainerConfig {
    /// Number of transitions in a training batch.
    pub batch_size: usize,

    /// Training starts once the replay buffer holds this many transitions.
    pub warmup_transitions: usize,

    /// Interval of publishing model parameters in optimization steps.
    pub sync_interval: usize,

    /// Interval of saving the model in optimization steps.
    pub save_interval: usize,

    /// Interval of recording training metrics in optimization steps.
    pub record_interval: usize,

    /// The maximum number of optimization steps. Unlimited if `None`.
    pub max_opts: Option<usize>,

    /// Wait before retrying when the replay buffer has too few transitions,
    /// in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for AsyncTrainerConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            warmup_transitions: 1000,
            sync_interval: 100,
            save_interval: 10_000,
            record_interval: 1000,
            max_opts: None,
            retry_backoff_ms: 10,
        }
    }
}

impl AsyncTrainerConfig {
    /// Constructs [AsyncTrainerConfig] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [AsyncTrainerConfig].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Checks that sizes, intervals and `max_opts` (when set) are positive.
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("batch_size", self.batch_size),
            ("sync_interval", self.sync_interval),
            ("save_interval", self.save_interval),
            ("record_interval", self.record_interval),
            ("max_opts", self.max_opts.unwrap_or(1)),
        ]
        .iter()
        .find(|(_, v)| *v == 0)
        .map(|(k, _)| *k);
        match zero {
            Some(k) => Err(SwarmError::InvalidConfig(format!("{} must be positive", k)).into()),
            None => Ok(()),
        }
    }

    /// Wait before retrying a batch.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the number of transitions required before training.
    pub fn warmup_transitions(mut self, v: usize) -> Self {
        self.warmup_transitions = v;
        self
    }

    /// Sets the interval of publishing parameters.
    pub fn sync_interval(mut self, v: usize) -> Self {
        self.sync_interval = v;
        self
    }

    /// Sets the interval of saving.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the interval of recording.
    pub fn record_interval(mut self, v: usize) -> Self {
        self.record_interval = v;
        self
    }

    /// Sets the maximum number of optimization steps.
    pub fn max_opts(mut self, v: usize) -> Self {
        self.max_opts = Some(v);
        self
    }

    /// Sets the retry wait in milliseconds.
    pub fn retry_backoff_ms(mut self, v: u64) -> Self {
        self.retry_backoff_ms = v;
        self
    }
}
