use crate::{
    messages::{ExitNotifier, Unit, UnitMessage},
    Actor, ActorConfig, ActorManagerConfig, ActorStat, AsyncTrainerError, Progress, StopSignal,
};
use anyhow::Result;
use crossbeam_channel::Sender;
use log::{error, info};
use std::{
    marker::PhantomData,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};
use swarm_core::{record::Recorder, Env, ExperienceBufferBase, Model, ParamSource, Transition};

/// Manages [`Actor`]s.
///
/// Each actor runs on its own thread named `actor-{id}`. When an actor thread
/// leaves its loop, for whatever reason, a [`UnitMessage::Exited`] is sent to
/// the channel given to [`ActorManager::build`].
pub struct ActorManager<E, M, B, R>
where
    E: Env,
    M: Model,
    B: ExperienceBufferBase<Item = Transition>,
    R: Recorder,
{
    n_actors: usize,
    actor_config: ActorConfig,
    env_config: E::Config,
    model_config: M::Config,
    buffer: Arc<B>,
    source: ParamSource,
    stop: Arc<StopSignal>,
    progress: Arc<Progress>,
    recorder: Arc<Mutex<R>>,
    exit_sender: Sender<UnitMessage>,

    /// Thread handles.
    threads: Vec<(usize, JoinHandle<Result<ActorStat>>)>,

    phantom: PhantomData<fn() -> (E, M)>,
}

impl<E, M, B, R> ActorManager<E, M, B, R>
where
    E: Env + 'static,
    M: Model + 'static,
    B: ExperienceBufferBase<Item = Transition> + Send + Sync + 'static,
    R: Recorder + Send + 'static,
    E::Config: Send + 'static,
    M::Config: Send + 'static,
{
    /// Builds a [`ActorManager`].
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        config: &ActorManagerConfig,
        actor_config: &ActorConfig,
        env_config: &E::Config,
        model_config: &M::Config,
        buffer: Arc<B>,
        source: ParamSource,
        stop: Arc<StopSignal>,
        progress: Arc<Progress>,
        recorder: Arc<Mutex<R>>,
        exit_sender: Sender<UnitMessage>,
    ) -> Self {
        Self {
            n_actors: config.n_actors,
            actor_config: actor_config.clone(),
            env_config: env_config.clone(),
            model_config: model_config.clone(),
            buffer,
            source,
            stop,
            progress,
            recorder,
            exit_sender,
            threads: vec![],
            phantom: PhantomData,
        }
    }

    /// Number of actors.
    pub fn n_actors(&self) -> usize {
        self.n_actors
    }

    /// Spawns the actor threads.
    ///
    /// If a thread cannot be spawned, the stop signal is raised so that
    /// already running actors wind down, and the error is returned. The
    /// running actors still have to be joined.
    pub fn run(&mut self) -> Result<()> {
        for id in 0..self.n_actors {
            let actor = Actor::<E, M, B, R>::build(
                id,
                self.actor_config.clone(),
                self.env_config.clone(),
                self.model_config.clone(),
                self.buffer.clone(),
                self.source.clone(),
                self.stop.clone(),
                self.progress.clone(),
                self.recorder.clone(),
            );
            let notifier = ExitNotifier::new(Unit::Actor(id), self.exit_sender.clone());
            let name = Unit::Actor(id).to_string();

            let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
                let _notifier = notifier;
                actor.run()
            });
            match spawned {
                Ok(handle) => self.threads.push((id, handle)),
                Err(e) => {
                    error!("Failed to spawn {}: {}", name, e);
                    self.stop.raise();
                    return Err(AsyncTrainerError::SpawnUnit(name).into());
                }
            }
        }
        info!("Started {} actors", self.threads.len());
        Ok(())
    }

    /// Waits until all actors finish.
    ///
    /// Actors that failed or panicked are logged and left out of the
    /// returned stats.
    pub fn join(self) -> Vec<ActorStat> {
        let mut stats = vec![];
        for (id, handle) in self.threads {
            match handle.join() {
                Ok(Ok(stat)) => stats.push(stat),
                Ok(Err(e)) => error!("Actor {} failed: {:?}", id, e),
                Err(_) => error!(
                    "{}",
                    AsyncTrainerError::UnitPanicked(Unit::Actor(id).to_string())
                ),
            }
        }
        stats
    }

    /// Stops actor threads.
    pub fn stop(&self) {
        self.stop.raise();
    }

    /// Stops and joins actors.
    pub fn stop_and_join(self) -> Vec<ActorStat> {
        self.stop();
        self.join()
    }
}
