//! Core traits shared by actors and the learner.
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use env::{Env, EnvGuard};
pub use policy::{Model, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use step::Step;
