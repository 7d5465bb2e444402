//! Bounded replay buffer shared by actors and the learner.
mod base;
mod config;
mod step_proc;
pub use base::{ReplayBuffer, ReplayBufferStat};
pub use config::{EvictionPolicy, ReplayBufferConfig};
pub use step_proc::NStepProcessor;
