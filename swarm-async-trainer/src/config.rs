//! Configuration of a whole training run.
use crate::{ActorConfig, ActorManagerConfig, AsyncTrainerConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use swarm_core::{error::SwarmError, ReplayBufferConfig};

/// Configuration of [`train_async`](crate::train_async).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct TrainConfig {
    /// Where to save the trained parameters. Nothing is saved if `None`.
    pub model_dir: Option<String>,

    /// Configuration of the replay buffer.
    pub replay_buffer: ReplayBufferConfig,

    /// Configuration shared by all actors.
    pub actor: ActorConfig,

    /// Configuration of [`ActorManager`](crate::ActorManager).
    pub actor_manager: ActorManagerConfig,

    /// Configuration of [`AsyncTrainer`](crate::AsyncTrainer).
    pub async_trainer: AsyncTrainerConfig,
}

impl TrainConfig {
    /// Constructs [TrainConfig] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [TrainConfig].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Validates every part of the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.actor_manager.n_actors == 0 {
            return Err(SwarmError::InvalidConfig("n_actors must be positive".into()).into());
        }
        self.replay_buffer.validate()?;
        self.actor.validate()?;
        self.async_trainer.validate()
    }

    /// Sets the directory the trained parameters being saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the configuration of the replay buffer.
    pub fn replay_buffer(mut self, v: ReplayBufferConfig) -> Self {
        self.replay_buffer = v;
        self
    }

    /// Sets the configuration of actors.
    pub fn actor(mut self, v: ActorConfig) -> Self {
        self.actor = v;
        self
    }

    /// Sets the number of actors.
    pub fn n_actors(mut self, n_actors: usize) -> Self {
        self.actor_manager = ActorManagerConfig::new(n_actors);
        self
    }

    /// Sets the configuration of the learner.
    pub fn async_trainer(mut self, v: AsyncTrainerConfig) -> Self {
        self.async_trainer = v;
        self
    }
}
