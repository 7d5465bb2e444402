use serde::{Deserialize, Serialize};

/// Configuration of [ActorManager](super::ActorManager).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActorManagerConfig {
    /// Number of actor threads.
    ///
    /// The default value is 4.
    pub n_actors: usize,
}

impl Default for ActorManagerConfig {
    fn default() -> Self {
        Self { n_actors: 4 }
    }
}

impl ActorManagerConfig {
    /// Constructs [ActorManagerConfig] with the given number of actors.
    pub fn new(n_actors: usize) -> Self {
        Self { n_actors }
    }
}
