use super::Record;
use anyhow::Result;

/// Writes a record to an output destination with [`Recorder::write`].
///
/// Actors write one record per completed episode, the learner one per
/// recording interval. A failing recorder must never stop training, so
/// callers log the returned error and carry on.
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record) -> Result<()>;
}
