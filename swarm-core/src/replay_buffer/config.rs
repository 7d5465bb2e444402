//! Configuration of [`ReplayBuffer`](super::ReplayBuffer).
use crate::error::SwarmError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Which transition is dropped when a full buffer receives a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Evict the oldest transition.
    Fifo,

    /// Evict a transition chosen uniformly at random.
    Random,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::Fifo
    }
}

/// Configuration of [`ReplayBuffer`](super::ReplayBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of transitions.
    pub capacity: usize,

    /// Eviction policy applied at capacity.
    #[serde(default)]
    pub eviction: EvictionPolicy,

    /// Seed of the random number generator used for sampling and eviction.
    pub seed: u64,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            eviction: EvictionPolicy::Fifo,
            seed: 42,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the eviction policy.
    pub fn eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(SwarmError::InvalidConfig("capacity must be positive".into()).into());
        }
        Ok(())
    }

    /// Constructs [`ReplayBufferConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ReplayBufferConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_buffer_config() -> Result<()> {
        let config = ReplayBufferConfig::default()
            .capacity(100)
            .eviction(EvictionPolicy::Random)
            .seed(7);
        let dir = TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("replay_buffer.yaml");
        config.save(&path)?;
        let config_ = ReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_eviction_defaults_to_fifo() -> Result<()> {
        let config: ReplayBufferConfig = serde_yaml::from_str("capacity: 10\nseed: 1\n")?;
        assert_eq!(config.eviction, EvictionPolicy::Fifo);
        assert!(ReplayBufferConfig::default().capacity(0).validate().is_err());
        Ok(())
    }
}
