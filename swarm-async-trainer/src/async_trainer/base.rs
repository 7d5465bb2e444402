use crate::{AsyncTrainStat, AsyncTrainerConfig, Progress, StopSignal};
use anyhow::Result;
use log::{debug, info, warn};
use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use swarm_core::{
    error::SwarmError,
    record::{Record, RecordValue::Scalar, Recorder},
    ExperienceBufferBase, Model, ParamPublisher, ReplayBufferBase, Saver, TransitionBatch,
};

/// Manages the training loop of the canonical model.
///
/// It will be used with [ActorManager](crate::ActorManager). The trainer is
/// the only writer of model parameters: it samples batches from the replay
/// buffer shared with the actors, performs optimization steps and publishes
/// snapshots of the parameters through its [`ParamPublisher`].
///
/// The loop ends when the stop signal is raised or, if configured, after
/// `max_opts` optimization steps, in which case the trainer raises the stop
/// signal itself. Parameters are published once more on exit.
pub struct AsyncTrainer<M, B, R, S>
where
    M: Model,
    B: ReplayBufferBase<Batch = TransitionBatch> + ExperienceBufferBase,
    R: Recorder,
    S: Saver,
{
    config: AsyncTrainerConfig,
    model: M,
    publisher: ParamPublisher,
    buffer: Arc<B>,
    stop: Arc<StopSignal>,
    progress: Arc<Progress>,
    recorder: Arc<Mutex<R>>,
    saver: Arc<Mutex<S>>,
}

impl<M, B, R, S> AsyncTrainer<M, B, R, S>
where
    M: Model,
    B: ReplayBufferBase<Batch = TransitionBatch> + ExperienceBufferBase,
    R: Recorder,
    S: Saver,
{
    /// Creates [AsyncTrainer].
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        config: &AsyncTrainerConfig,
        model: M,
        publisher: ParamPublisher,
        buffer: Arc<B>,
        stop: Arc<StopSignal>,
        progress: Arc<Progress>,
        recorder: Arc<Mutex<R>>,
        saver: Arc<Mutex<S>>,
    ) -> Self {
        Self {
            config: config.clone(),
            model,
            publisher,
            buffer,
            stop,
            progress,
            recorder,
            saver,
        }
    }

    /// Samples a batch, waiting while the buffer is warming up.
    ///
    /// Returns `None` if the stop signal was raised while waiting.
    fn next_batch(&self) -> Result<Option<TransitionBatch>> {
        let backoff = self.config.retry_backoff();
        loop {
            if self.stop.is_raised() {
                return Ok(None);
            }
            if self.buffer.len() < self.config.warmup_transitions {
                self.stop.wait_timeout(backoff);
                continue;
            }
            match self.buffer.batch(self.config.batch_size) {
                Ok(batch) => return Ok(Some(batch)),
                Err(e) if SwarmError::is_insufficient_data(&e) => {
                    debug!("Waiting for transitions: {}", e);
                    self.stop.wait_timeout(backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Publishes the current parameters.
    fn sync(&mut self, opt_steps: usize) {
        let version = self.publisher.publish(self.model.params(), opt_steps);
        debug!("Published parameters of version {}", version);
    }

    /// Saves the latest published parameters.
    fn save(&mut self) {
        let snapshot = self.publisher.source().latest();
        let episodes = self.progress.episodes();
        match self.saver.lock() {
            Ok(mut saver) => {
                if let Err(e) = saver.save(episodes, &snapshot) {
                    warn!("Failed to save parameters: {:#}", e);
                }
            }
            Err(_) => warn!("Saver lock is poisoned, skipped saving"),
        }
    }

    /// Adds throughput to the record and writes it.
    fn record(
        &mut self,
        mut record: Record,
        opt_steps: usize,
        opt_steps_: &mut usize,
        time: &mut Instant,
    ) {
        let duration = time.elapsed().as_secs_f32();
        let ops = if duration > 0.0 {
            (*opt_steps_ as f32) / duration
        } else {
            0.0
        };
        record.insert("opt_steps", Scalar(opt_steps as _));
        record.insert("opt_steps_per_sec", Scalar(ops));
        record.insert("buffer_len", Scalar(self.buffer.len() as _));

        // Reset counter
        *opt_steps_ = 0;
        *time = Instant::now();

        match self.recorder.lock() {
            Ok(mut recorder) => {
                if let Err(e) = recorder.write(record) {
                    warn!("Failed to write a record: {:#}", e);
                }
            }
            Err(_) => warn!("Recorder lock is poisoned"),
        }
    }

    /// Runs training loop.
    pub fn train(mut self) -> Result<AsyncTrainStat> {
        self.config.validate()?;
        let start = Instant::now();
        let start_opt_steps = self.publisher.source().latest().opt_steps();
        let start_transitions = self.progress.transitions();
        let mut opt_steps = start_opt_steps;
        let mut opt_steps_ = 0;
        let mut time = Instant::now();
        info!("Learner started");

        while let Some(batch) = self.next_batch()? {
            let record = self.model.train_step(&batch)?;
            opt_steps += 1;
            opt_steps_ += 1;
            let n = opt_steps - start_opt_steps;

            let do_sync = n % self.config.sync_interval == 0;
            let do_save = n % self.config.save_interval == 0;
            let do_record = n % self.config.record_interval == 0;

            if do_sync || do_save {
                self.sync(opt_steps);
            }
            if do_save {
                self.save();
            }
            if do_record {
                self.record(record, opt_steps, &mut opt_steps_, &mut time);
            }
            if Some(n) == self.config.max_opts {
                info!("Learner reached {} optimization steps", n);
                self.stop.raise();
                break;
            }
        }

        if self.publisher.source().latest().opt_steps() != opt_steps {
            self.sync(opt_steps);
        }

        let duration = start.elapsed();
        let secs = duration.as_secs_f32().max(f32::EPSILON);
        let n = opt_steps - start_opt_steps;
        let samples = self.progress.transitions() - start_transitions;
        let stat = AsyncTrainStat {
            opt_steps: n,
            samples_per_sec: samples as f32 / secs,
            duration,
            opt_per_sec: n as f32 / secs,
        };
        info!("Learner stopped after {} optimization steps", n);
        Ok(stat)
    }
}
