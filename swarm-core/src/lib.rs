#![warn(missing_docs)]
//! Core types for asynchronous n-step experience collection.
//!
//! * [`Transition`] and [`TransitionBatch`] - training samples
//! * [`ReplayBuffer`] - bounded buffer shared by actors and the learner
//! * [`NStepProcessor`] - turns environment steps into n-step transitions
//! * [`EpisodeSchedule`] - per-episode step cap and exploration noise
//! * [`ParamSnapshot`], [`ParamPublisher`], [`ParamSource`] - parameter
//!   distribution from the learner to actors
//! * [`Env`], [`Policy`], [`Model`], [`Saver`], [`record::Recorder`] -
//!   interfaces of the collaborators
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{Env, EnvGuard, ExperienceBufferBase, Model, Policy, ReplayBufferBase, Step};

mod param;
pub use param::{param_channel, ParamPublisher, ParamSnapshot, ParamSource};

mod saver;
pub use saver::{FileSaver, NullSaver, Saver};

mod schedule;
pub use schedule::EpisodeSchedule;

mod transition;
pub use transition::{Transition, TransitionBatch};

pub use replay_buffer::{
    EvictionPolicy, NStepProcessor, ReplayBuffer, ReplayBufferConfig, ReplayBufferStat,
};
