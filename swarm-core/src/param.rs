//! Publication of model parameters from the learner to actors.
//!
//! The learner owns the only [`ParamPublisher`]; actors hold clones of the
//! [`ParamSource`]. Each publication stores a new immutable
//! [`ParamSnapshot`] behind an [`Arc`] and swaps it into the slot, so a reader
//! either gets the previous snapshot or the new one, never a mix of both.
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};

/// An immutable, versioned copy of model parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParamSnapshot {
    version: u64,
    opt_steps: usize,
    params: Vec<f32>,
}

impl ParamSnapshot {
    /// Constructs a snapshot.
    pub fn new(version: u64, opt_steps: usize, params: Vec<f32>) -> Self {
        Self {
            version,
            opt_steps,
            params,
        }
    }

    /// Publication counter; `0` for the initial parameters.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of optimization steps the parameters went through.
    pub fn opt_steps(&self) -> usize {
        self.opt_steps
    }

    /// The flat parameter vector.
    pub fn params(&self) -> &[f32] {
        &self.params
    }
}

struct Slot {
    latest: RwLock<Arc<ParamSnapshot>>,
    version: AtomicU64,
}

/// Creates a publisher and a source sharing a slot holding `initial`.
pub fn param_channel(initial: ParamSnapshot) -> (ParamPublisher, ParamSource) {
    let version = initial.version();
    let slot = Arc::new(Slot {
        latest: RwLock::new(Arc::new(initial)),
        version: AtomicU64::new(version),
    });
    let publisher = ParamPublisher {
        slot: slot.clone(),
        version,
    };
    (publisher, ParamSource { slot })
}

/// The writing end of a parameter slot.
///
/// Not [`Clone`]: there is exactly one writer per slot.
pub struct ParamPublisher {
    slot: Arc<Slot>,
    version: u64,
}

impl ParamPublisher {
    /// Publishes new parameters and returns their version.
    pub fn publish(&mut self, params: Vec<f32>, opt_steps: usize) -> u64 {
        self.version += 1;
        let snapshot = Arc::new(ParamSnapshot::new(self.version, opt_steps, params));
        let mut latest = self
            .slot
            .latest
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *latest = snapshot;
        self.slot.version.store(self.version, Ordering::Release);
        self.version
    }

    /// Version of the last publication.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns a new reading end of the slot.
    pub fn source(&self) -> ParamSource {
        ParamSource {
            slot: self.slot.clone(),
        }
    }
}

/// The reading end of a parameter slot.
#[derive(Clone)]
pub struct ParamSource {
    slot: Arc<Slot>,
}

impl ParamSource {
    /// Returns the most recently published snapshot.
    pub fn latest(&self) -> Arc<ParamSnapshot> {
        self.slot
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Version of the most recently published snapshot, without locking.
    pub fn version(&self) -> u64 {
        self.slot.version.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_publish_increments_version() {
        let (mut publisher, source) = param_channel(ParamSnapshot::new(0, 0, vec![0.0; 3]));
        assert_eq!(source.version(), 0);
        assert_eq!(publisher.publish(vec![1.0; 3], 10), 1);
        assert_eq!(publisher.publish(vec![2.0; 3], 20), 2);

        let latest = source.latest();
        assert_eq!(latest.version(), 2);
        assert_eq!(latest.opt_steps(), 20);
        assert_eq!(latest.params(), &[2.0, 2.0, 2.0][..]);
    }

    #[test]
    fn test_readers_never_see_torn_snapshots() {
        let n_params = 1024;
        let n_publish = 500;
        let (mut publisher, source) =
            param_channel(ParamSnapshot::new(0, 0, vec![0.0; n_params]));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let source = source.clone();
                thread::spawn(move || {
                    let mut last_version = 0;
                    loop {
                        let snapshot = source.latest();
                        let v = snapshot.version();
                        assert!(v >= last_version);
                        assert!(snapshot.params().iter().all(|&p| p == v as f32));
                        last_version = v;
                        if v == n_publish {
                            break;
                        }
                    }
                })
            })
            .collect();

        for v in 1..=n_publish {
            publisher.publish(vec![v as f32; n_params], v as usize);
        }
        for r in readers {
            r.join().unwrap();
        }
    }
}
