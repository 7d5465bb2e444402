//! Records of training metrics and the recorders that consume them.
//!
//! * [`Record`] - key-value container of [`RecordValue`]s
//! * [`Recorder`] - the metrics collaborator written to by actors and the learner
//! * [`BufferedRecorder`] - keeps records in memory, for tests
//! * [`NullRecorder`] - discards records
//! * [`LogRecorder`] - writes records through the [`log`] facade
//!
//! ```rust
//! use swarm_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode_reward", RecordValue::Scalar(-3.5));
//! record.insert("episode_steps", RecordValue::Scalar(200.0));
//! record.insert("noise_scale", RecordValue::Scalar(0.9));
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
