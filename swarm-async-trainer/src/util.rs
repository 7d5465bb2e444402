//! Utility function.
use crate::{
    actor_stats_fmt,
    messages::{ExitNotifier, Unit, UnitMessage},
    ActorManager, ActorStat, AsyncTrainStat, AsyncTrainer, AsyncTrainerError, Progress,
    StopSignal, TrainConfig,
};
use anyhow::{anyhow, Result};
use crossbeam_channel::unbounded;
use log::{error, info};
use std::{
    sync::{Arc, Mutex},
    thread,
};
use swarm_core::{
    param_channel, record::Recorder, Env, ExperienceBufferBase, Model, ParamSnapshot, ReplayBuffer,
    ReplayBufferBase, Saver,
};

/// Outcome of [`train_async`].
pub struct AsyncTrainReport {
    /// Stats of the actors that finished without error.
    pub actor_stats: Vec<ActorStat>,

    /// Stats of the learner, `None` if it failed.
    pub trainer_stat: Option<AsyncTrainStat>,

    /// Completed episodes over all actors.
    pub episodes: usize,

    /// Environment steps over all actors.
    pub env_steps: usize,

    /// The snapshot given to the final save.
    pub snapshot: Arc<ParamSnapshot>,

    /// The replay buffer at the end of training.
    pub buffer: Arc<ReplayBuffer>,
}

/// Runs asynchronous training.
///
/// This function runs [`ActorManager`] and [`AsyncTrainer`] on threads. They
/// share a [`ReplayBuffer`], a parameter channel from the learner to the
/// actors, progress counters and `stop`.
///
/// ```mermaid
/// flowchart LR
///   subgraph actors
///     A0[actor-0]
///     A1[actor-1]
///   end
///   A0 -- push --> B[(ReplayBuffer)]
///   A1 -- push --> B
///   B -- batch --> L[learner]
///   L -- publish --> P[[ParamSource]]
///   P -- refresh --> A0
///   P -- refresh --> A1
///   L -- save --> S[(Saver)]
/// ```
///
/// * Before starting, the learner model takes the parameters restored by
///   `saver`, if any.
/// * When every actor has exited, `stop` is raised so that the learner
///   finishes. `stop` can also be raised by the caller at any time.
/// * After all threads are joined, the latest published parameters are saved
///   with the total number of completed episodes.
#[cfg_attr(doc, aquamarine::aquamarine)]
pub fn train_async<E, M, R, S>(
    config: &TrainConfig,
    env_config: &E::Config,
    model_config: &M::Config,
    recorder: Arc<Mutex<R>>,
    saver: Arc<Mutex<S>>,
    stop: Arc<StopSignal>,
) -> Result<AsyncTrainReport>
where
    E: Env + 'static,
    M: Model + Send + 'static,
    R: Recorder + Send + 'static,
    S: Saver + Send + 'static,
    E::Config: Send + 'static,
    M::Config: Send + 'static,
{
    config.validate()?;
    let buffer = Arc::new(ReplayBuffer::build(&config.replay_buffer)?);

    // Canonical model, optionally restored
    let mut model = M::build(model_config)?;
    let restored = saver
        .lock()
        .map_err(|_| anyhow!("Saver lock is poisoned"))?
        .load()?;
    let initial = match restored {
        Some(snapshot) => {
            model.apply_params(snapshot.params())?;
            info!(
                "Restored parameters of version {} ({} opt steps)",
                snapshot.version(),
                snapshot.opt_steps()
            );
            snapshot
        }
        None => ParamSnapshot::new(0, 0, model.params()),
    };
    let (publisher, source) = param_channel(initial);
    let progress = Arc::new(Progress::new());
    let (exit_s, exit_r) = unbounded();

    let mut actors = ActorManager::<E, M, ReplayBuffer, R>::build(
        &config.actor_manager,
        &config.actor,
        env_config,
        model_config,
        buffer.clone(),
        source.clone(),
        stop.clone(),
        progress.clone(),
        recorder.clone(),
        exit_s.clone(),
    );
    let trainer = AsyncTrainer::build(
        &config.async_trainer,
        model,
        publisher,
        buffer.clone(),
        stop.clone(),
        progress.clone(),
        recorder,
        saver.clone(),
    );

    // Starts sampling and training
    if let Err(e) = actors.run() {
        actors.join();
        return Err(e);
    }
    let learner = {
        let notifier = ExitNotifier::new(Unit::Learner, exit_s);
        thread::Builder::new()
            .name(Unit::Learner.to_string())
            .spawn(move || {
                let _notifier = notifier;
                trainer.train()
            })
    };
    let learner = match learner {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to spawn the learner: {}", e);
            actors.stop_and_join();
            return Err(AsyncTrainerError::SpawnUnit(Unit::Learner.to_string()).into());
        }
    };

    // Waits for units to exit
    let mut n_actors = actors.n_actors();
    let mut n_units = n_actors + 1;
    while n_units > 0 {
        let unit = match exit_r.recv() {
            Ok(UnitMessage::Exited(unit)) => unit,
            Err(_) => break,
        };
        n_units -= 1;
        info!("{} exited", unit);
        match unit {
            Unit::Actor(_) => {
                n_actors -= 1;
                if n_actors == 0 {
                    info!("All actors finished");
                    stop.raise();
                }
            }
            Unit::Learner => stop.raise(),
        }
    }

    let actor_stats = actors.join();
    let trainer_stat = match learner.join() {
        Ok(Ok(stat)) => Some(stat),
        Ok(Err(e)) => {
            error!("Learner failed: {:?}", e);
            None
        }
        Err(_) => {
            error!("{}", AsyncTrainerError::UnitPanicked(Unit::Learner.to_string()));
            None
        }
    };

    if let Some(stat) = trainer_stat.as_ref() {
        info!("Stats of async trainer");
        info!("{}", stat.fmt());
    }
    info!("Stats of generated samples in actors");
    info!("{}", actor_stats_fmt(&actor_stats));
    info!("Replay buffer holds {} transitions", buffer.len());

    // Final save
    let episodes = progress.episodes();
    let snapshot = source.latest();
    saver
        .lock()
        .map_err(|_| anyhow!("Saver lock is poisoned"))?
        .save(episodes, &snapshot)?;

    Ok(AsyncTrainReport {
        actor_stats,
        trainer_stat,
        episodes,
        env_steps: progress.env_steps(),
        snapshot,
        buffer,
    })
}
