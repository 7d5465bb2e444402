//! Asynchronous n-step experience collection with a single learner.
//!
//! * [`Actor`]s run episodes on their own environments, turn steps into n-step
//!   transitions and push them into a shared
//!   [`ReplayBuffer`](swarm_core::ReplayBuffer).
//! * The [`AsyncTrainer`] samples batches, trains the canonical model and
//!   publishes parameter snapshots, which actors pull every
//!   `refresh_interval` episodes into their [`PolicyReplica`].
//! * [`train_async`] wires both together, supervises the threads and saves the
//!   final parameters.
//!
//! Cancellation is cooperative through a shared [`StopSignal`].
mod actor;
mod actor_manager;
mod async_trainer;
mod config;
mod error;
mod messages;
mod policy_replica;
mod stop;
mod util;
pub use actor::{actor_stats_fmt, Actor, ActorConfig, ActorStat, Exploration};
pub use actor_manager::{ActorManager, ActorManagerConfig};
pub use async_trainer::{AsyncTrainStat, AsyncTrainer, AsyncTrainerConfig};
pub use config::TrainConfig;
pub use error::AsyncTrainerError;
pub use messages::{Unit, UnitMessage};
pub use policy_replica::PolicyReplica;
pub use stop::{Progress, StopSignal};
pub use util::{train_async, AsyncTrainReport};
