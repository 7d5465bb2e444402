//! Thread-safe bounded replay buffer.
use super::{EvictionPolicy, ReplayBufferConfig};
use crate::{
    error::SwarmError, ExperienceBufferBase, ReplayBufferBase, Transition, TransitionBatch,
};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Counters of a [`ReplayBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayBufferStat {
    /// Current number of transitions.
    pub len: usize,

    /// Total number of transitions pushed since construction.
    pub n_pushed: usize,

    /// Total number of transitions evicted since construction.
    pub n_evicted: usize,
}

struct Inner {
    items: VecDeque<Arc<Transition>>,
    rng: StdRng,
    n_pushed: usize,
    n_evicted: usize,
}

/// A bounded replay buffer of [`Transition`]s.
///
/// All operations take a single mutex around the storage and the random
/// number generator. `push` is O(1) and `batch` is O(batch size), so the lock
/// is held only briefly. The size never exceeds the capacity: a push into a
/// full buffer first evicts one transition according to [`EvictionPolicy`].
pub struct ReplayBuffer {
    capacity: usize,
    eviction: EvictionPolicy,
    inner: Mutex<Inner>,
}

impl ReplayBuffer {
    // Every operation leaves `Inner` consistent before it can panic, so a
    // poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the counters of the buffer.
    pub fn stats(&self) -> ReplayBufferStat {
        let inner = self.lock();
        ReplayBufferStat {
            len: inner.items.len(),
            n_pushed: inner.n_pushed,
            n_evicted: inner.n_evicted,
        }
    }

    /// Returns the resident transitions, oldest first for [`EvictionPolicy::Fifo`].
    pub fn contents(&self) -> Vec<Arc<Transition>> {
        self.lock().items.iter().cloned().collect()
    }
}

impl ExperienceBufferBase for ReplayBuffer {
    type Item = Transition;

    fn push(&self, tr: Transition) -> Result<()> {
        let tr = Arc::new(tr);
        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner.items.len() >= self.capacity {
            match self.eviction {
                EvictionPolicy::Fifo => {
                    inner.items.pop_front();
                }
                EvictionPolicy::Random => {
                    let ix = inner.rng.gen_range(0..inner.items.len());
                    inner.items.swap_remove_back(ix);
                }
            }
            inner.n_evicted += 1;
        }
        inner.items.push_back(tr);
        inner.n_pushed += 1;

        Ok(())
    }

    fn len(&self) -> usize {
        self.lock().items.len()
    }
}

impl ReplayBufferBase for ReplayBuffer {
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            capacity: config.capacity,
            eviction: config.eviction,
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(config.capacity),
                rng: StdRng::seed_from_u64(config.seed),
                n_pushed: 0,
                n_evicted: 0,
            }),
        })
    }

    /// Samples `size` transitions uniformly at random with replacement.
    fn batch(&self, size: usize) -> Result<Self::Batch> {
        let mut guard = self.lock();
        let Inner { items, rng, .. } = &mut *guard;
        let len = items.len();

        if len == 0 {
            return Err(SwarmError::InsufficientData {
                requested: size,
                available: 0,
            }
            .into());
        }

        let transitions = (0..size)
            .map(|_| items[rng.gen_range(0..len)].clone())
            .collect();

        Ok(TransitionBatch::new(transitions))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{collections::HashSet, thread};
    use test_log::test;

    fn transition(id: usize) -> Transition {
        Transition::new(vec![id as f32], vec![0.0], id as f32, vec![id as f32 + 1.0], false)
    }

    fn id_of(tr: &Transition) -> usize {
        tr.state()[0] as usize
    }

    fn build(capacity: usize, eviction: EvictionPolicy) -> ReplayBuffer {
        let config = ReplayBufferConfig::default()
            .capacity(capacity)
            .eviction(eviction);
        ReplayBuffer::build(&config).unwrap()
    }

    #[test]
    fn test_fifo_evicts_first_inserted() {
        let capacity = 10;
        let buffer = build(capacity, EvictionPolicy::Fifo);
        for i in 0..=capacity {
            buffer.push(transition(i)).unwrap();
        }

        let ids: Vec<usize> = buffer.contents().iter().map(|t| id_of(t)).collect();
        assert_eq!(buffer.len(), capacity);
        assert!(!ids.contains(&0));
        assert_eq!(ids, (1..=capacity).collect::<Vec<_>>());
        assert_eq!(buffer.stats().n_evicted, 1);
    }

    #[test]
    fn test_random_eviction_keeps_capacity_and_newest() {
        let capacity = 8;
        let buffer = build(capacity, EvictionPolicy::Random);
        for i in 0..100 {
            buffer.push(transition(i)).unwrap();
            assert!(buffer.len() <= capacity);
            let ids: HashSet<usize> = buffer.contents().iter().map(|t| id_of(t)).collect();
            assert!(ids.contains(&i));
            assert_eq!(ids.len(), buffer.len());
        }
        let stat = buffer.stats();
        assert_eq!(stat.n_pushed, 100);
        assert_eq!(stat.n_evicted, 100 - capacity);
    }

    #[test]
    fn test_empty_buffer_reports_insufficient_data() {
        let buffer = build(4, EvictionPolicy::Fifo);
        let err = buffer.batch(2).unwrap_err();
        assert!(SwarmError::is_insufficient_data(&err));
    }

    #[test]
    fn test_batch_samples_with_replacement_from_contents() {
        let buffer = build(4, EvictionPolicy::Fifo);
        buffer.push(transition(3)).unwrap();
        let batch = buffer.batch(16).unwrap();
        assert_eq!(batch.len(), 16);
        assert!(batch.iter().all(|t| id_of(t) == 3));
    }

    #[test]
    fn test_concurrent_push_and_batch() {
        let capacity = 64;
        let n_writers = 4;
        let n_per_writer = 500;
        let buffer = Arc::new(build(capacity, EvictionPolicy::Fifo));

        let writers: Vec<_> = (0..n_writers)
            .map(|w| {
                let buffer = buffer.clone();
                thread::spawn(move || {
                    for i in 0..n_per_writer {
                        buffer.push(transition(w * n_per_writer + i)).unwrap();
                        assert!(buffer.len() <= capacity);
                    }
                })
            })
            .collect();

        let reader = {
            let buffer = buffer.clone();
            thread::spawn(move || {
                let mut n_batches = 0;
                while n_batches < 200 {
                    match buffer.batch(8) {
                        Ok(batch) => {
                            assert_eq!(batch.len(), 8);
                            for tr in batch.iter() {
                                // Every sample must be a complete transition.
                                assert_eq!(tr.next_state()[0], tr.state()[0] + 1.0);
                                assert_eq!(tr.n_step_return(), tr.state()[0]);
                            }
                            n_batches += 1;
                        }
                        Err(e) => assert!(SwarmError::is_insufficient_data(&e)),
                    }
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        let stat = buffer.stats();
        assert_eq!(stat.len, capacity);
        assert_eq!(stat.n_pushed, n_writers * n_per_writer);
        assert_eq!(stat.n_evicted, n_writers * n_per_writer - capacity);
    }

    #[test]
    fn test_sampled_transitions_are_resident() {
        let capacity = 5;
        let buffer = build(capacity, EvictionPolicy::Fifo);
        for i in 0..20 {
            buffer.push(transition(i)).unwrap();
            let resident: HashSet<usize> = buffer.contents().iter().map(|t| id_of(t)).collect();
            let batch = buffer.batch(10).unwrap();
            assert!(batch.iter().all(|t| resident.contains(&id_of(t))));
        }
    }
}
