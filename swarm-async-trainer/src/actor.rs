//! Takes samples from the environment and pushes them to the replay buffer.
mod base;
mod config;
mod exploration;
mod stat;
pub use base::Actor;
pub use config::ActorConfig;
pub use exploration::Exploration;
pub use stat::{actor_stats_fmt, ActorStat};
