use super::{Record, RecordValue, Recorder};
use anyhow::Result;
use chrono::Local;
use log::info;

/// Writes records as single log lines through the [`log`] facade.
///
/// Each line is prefixed with `prefix` and stamped with the local time.
#[derive(Debug, Clone)]
pub struct LogRecorder {
    prefix: String,
}

impl LogRecorder {
    /// Constructs a recorder whose lines start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new("record")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, mut record: Record) -> Result<()> {
        record.insert("time", RecordValue::DateTime(Local::now()));
        info!("[{}] {}", self.prefix, record);
        Ok(())
    }
}
