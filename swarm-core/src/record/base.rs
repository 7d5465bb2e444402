//! Key-value records written by actors and the learner.
use crate::error::SwarmError;
use chrono::prelude::{DateTime, Local};
use std::{collections::BTreeMap, fmt};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like reward or loss.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A container of key-value pairs.
///
/// Keys are kept sorted so that records are formatted deterministically.
///
/// ```rust
/// use swarm_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_slice(&[("episode_reward", RecordValue::Scalar(12.0))]);
/// record.insert("noise_scale", RecordValue::Scalar(0.5));
/// assert_eq!(record.get_scalar("noise_scale").unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, SwarmError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(SwarmError::RecordValueTypeError("Scalar".to_string())),
            None => Err(SwarmError::RecordKeyError(k.to_string())),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.0.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let mut record = Record::from_slice(&[("reward", RecordValue::Scalar(2.0))]);
        record.insert("time", RecordValue::DateTime(Local::now()));
        assert_eq!(record.get_scalar("reward"), Ok(2.0));
        assert_eq!(
            record.get_scalar("time"),
            Err(SwarmError::RecordValueTypeError("Scalar".to_string()))
        );
        assert_eq!(
            record.get_scalar("missing"),
            Err(SwarmError::RecordKeyError("missing".to_string()))
        );
    }

    #[test]
    fn test_display_is_sorted() {
        let record = Record::from_slice(&[
            ("b", RecordValue::Scalar(2.0)),
            ("a", RecordValue::Scalar(1.0)),
        ]);
        assert_eq!(format!("{}", record), "a: 1, b: 2");
    }
}
