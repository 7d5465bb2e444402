use super::Exploration;
use crate::{ActorConfig, ActorStat, PolicyReplica, Progress, StopSignal};
use anyhow::Result;
use log::{debug, info, warn};
use std::{
    marker::PhantomData,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use swarm_core::{
    record::{Record, RecordValue::Scalar, Recorder},
    Env, EnvGuard, ExperienceBufferBase, Model, NStepProcessor, ParamSource, Policy, Transition,
};

/// Wait before rebuilding a failed environment.
const REBUILD_BACKOFF: Duration = Duration::from_millis(10);

/// Summary of a completed episode.
struct Episode {
    reward: f32,
    steps: usize,
    noise_scale: f32,
}

/// Runs interaction between a [`PolicyReplica`] and an [`Env`], taking samples.
///
/// Samples are converted to n-step [`Transition`]s and pushed directly into
/// the shared replay buffer. The actor owns its environment, its model replica
/// and its n-step window; everything else is shared through handles given at
/// construction.
///
/// [`Actor::run`] loops over episodes until `max_episodes` episodes are
/// completed or the stop signal is observed. The stop signal is polled before
/// every environment step, so an actor finishes at most the step in flight
/// after the signal is raised. The pending n-step window is dropped at the end
/// of every episode, interrupted or not.
pub struct Actor<E, M, B, R>
where
    E: Env,
    M: Model,
    B: ExperienceBufferBase<Item = Transition>,
    R: Recorder,
{
    id: usize,
    config: ActorConfig,
    env_config: E::Config,
    model_config: M::Config,
    buffer: Arc<B>,
    source: ParamSource,
    stop: Arc<StopSignal>,
    progress: Arc<Progress>,
    recorder: Arc<Mutex<R>>,
    // Env and model are built inside the actor's thread.
    phantom: PhantomData<fn() -> (E, M)>,
}

impl<E, M, B, R> Actor<E, M, B, R>
where
    E: Env,
    M: Model,
    B: ExperienceBufferBase<Item = Transition>,
    R: Recorder,
{
    /// Creates an actor.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        id: usize,
        config: ActorConfig,
        env_config: E::Config,
        model_config: M::Config,
        buffer: Arc<B>,
        source: ParamSource,
        stop: Arc<StopSignal>,
        progress: Arc<Progress>,
        recorder: Arc<Mutex<R>>,
    ) -> Self {
        Self {
            id,
            config,
            env_config,
            model_config,
            buffer,
            source,
            stop,
            progress,
            recorder,
            phantom: PhantomData,
        }
    }

    /// Id of the actor.
    pub fn id(&self) -> usize {
        self.id
    }

    fn seed(&self) -> u64 {
        self.config.seed.wrapping_add(self.id as u64)
    }

    fn records(&self) -> bool {
        self.id == 0 || self.config.record_all_workers
    }

    /// Runs the sampling loop.
    ///
    /// Returns an error only when the actor cannot continue: the environment
    /// or the model cannot be built, or published parameters cannot be
    /// applied. A failing environment abandons the episode, which still uses
    /// up one of the `max_episodes` episodes, and is rebuilt after a short
    /// backoff before the next one.
    pub fn run(self) -> Result<ActorStat> {
        self.config.validate()?;
        let time = Instant::now();
        let mut stat = ActorStat {
            id: self.id,
            ..Default::default()
        };

        let mut env = EnvGuard::<E>::build(&self.env_config, self.seed() as i64)?;
        let mut needs_rebuild = false;
        let mut replica = PolicyReplica::new(M::build(&self.model_config)?, self.source.clone());
        replica.refresh()?;
        let mut step_proc = NStepProcessor::new(self.config.n_step, self.config.discount)?;
        let mut exploration = Exploration::new(
            self.config.action_low,
            self.config.action_high,
            self.seed(),
        );
        info!("Actor {} started", self.id);

        for i in 0..self.config.max_episodes {
            if self.stop.is_raised() {
                break;
            }
            if needs_rebuild {
                if self.stop.wait_timeout(REBUILD_BACKOFF) {
                    break;
                }
                let seed = self.seed().wrapping_add(stat.failed_episodes as u64);
                env = EnvGuard::build(&self.env_config, seed as i64)?;
                needs_rebuild = false;
            }

            let result = self.run_episode(
                i,
                &mut env,
                &replica,
                &mut step_proc,
                &mut exploration,
                &mut stat,
            );
            step_proc.reset();

            match result {
                Ok(Some(episode)) => {
                    stat.episodes += 1;
                    let total = self.progress.add_episode();
                    debug!(
                        "Actor {}: episode {}, reward {}, steps {}, noise scale {}",
                        self.id, i, episode.reward, episode.steps, episode.noise_scale
                    );
                    if self.records() {
                        self.record(i, total, &episode);
                    }
                    if stat.episodes % self.config.refresh_interval == 0 && replica.refresh()? {
                        debug!(
                            "Actor {}: refreshed policy to version {:?}",
                            self.id,
                            replica.version()
                        );
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        "Actor {}: environment failed in episode {}: {:#}",
                        self.id, i, e
                    );
                    stat.failed_episodes += 1;
                    env.close();
                    needs_rebuild = true;
                }
            }
        }

        env.close();
        stat.duration = time.elapsed();
        info!(
            "Actor {} stopped after {} episodes ({} env steps)",
            self.id, stat.episodes, stat.env_steps
        );
        Ok(stat)
    }

    /// Runs one episode. Returns `None` if the stop signal interrupted it.
    fn run_episode(
        &self,
        i: usize,
        env: &mut EnvGuard<E>,
        policy: &impl Policy,
        step_proc: &mut NStepProcessor,
        exploration: &mut Exploration,
        stat: &mut ActorStat,
    ) -> Result<Option<Episode>> {
        let step_cap = self.config.schedule.step_cap(i);
        let noise_scale = self.config.schedule.noise_scale(i);
        let mut state = env.reset()?;
        let mut reward = 0f32;
        let mut steps = 0;

        while steps < step_cap {
            if self.stop.is_raised() {
                return Ok(None);
            }

            let act = exploration.perturb(policy.infer_action(&state), noise_scale);
            let step = env.step(&act)?;
            steps += 1;
            reward += step.reward;
            stat.env_steps += 1;
            self.progress.add_env_step();

            if let Some(tr) =
                step_proc.process(state, act, step.reward, &step.next_state, step.is_done)
            {
                match self.buffer.push(tr) {
                    Ok(()) => {
                        stat.transitions += 1;
                        self.progress.add_transition();
                    }
                    Err(e) => warn!("Actor {}: dropped a transition: {:#}", self.id, e),
                }
            }

            if step.is_done {
                break;
            }
            state = step.next_state;
        }

        Ok(Some(Episode {
            reward,
            steps,
            noise_scale,
        }))
    }

    fn record(&self, i: usize, total_episodes: usize, episode: &Episode) {
        let record = Record::from_slice(&[
            ("actor", Scalar(self.id as f32)),
            ("episode", Scalar(i as f32)),
            ("total_episodes", Scalar(total_episodes as f32)),
            ("episode_reward", Scalar(episode.reward)),
            ("episode_steps", Scalar(episode.steps as f32)),
            ("noise_scale", Scalar(episode.noise_scale)),
        ]);
        match self.recorder.lock() {
            Ok(mut recorder) => {
                if let Err(e) = recorder.write(record) {
                    warn!("Actor {}: failed to write a record: {:#}", self.id, e);
                }
            }
            Err(_) => warn!("Actor {}: recorder lock is poisoned", self.id),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{sync::atomic::Ordering, thread, time::Duration};
    use swarm_core::{
        dummy::{CountdownEnv, CountdownEnvConfig, LinearPolicy, LinearPolicyConfig},
        param_channel,
        record::BufferedRecorder,
        EpisodeSchedule, ParamPublisher, ParamSnapshot, ReplayBuffer, ReplayBufferBase,
        ReplayBufferConfig,
    };
    use test_log::test;

    type TestActor = Actor<CountdownEnv, LinearPolicy, ReplayBuffer, BufferedRecorder>;

    struct Fixture {
        buffer: Arc<ReplayBuffer>,
        publisher: ParamPublisher,
        stop: Arc<StopSignal>,
        progress: Arc<Progress>,
        recorder: Arc<Mutex<BufferedRecorder>>,
    }

    fn model_config() -> LinearPolicyConfig {
        LinearPolicyConfig {
            state_dim: 1,
            ..Default::default()
        }
    }

    fn fixture() -> Fixture {
        let model = LinearPolicy::build(&model_config()).unwrap();
        let (publisher, _) = param_channel(ParamSnapshot::new(0, 0, model.params()));
        Fixture {
            buffer: Arc::new(ReplayBuffer::build(&ReplayBufferConfig::default()).unwrap()),
            publisher,
            stop: Arc::new(StopSignal::new()),
            progress: Arc::new(Progress::new()),
            recorder: Arc::new(Mutex::new(BufferedRecorder::new())),
        }
    }

    fn actor(id: usize, f: &Fixture, config: ActorConfig, env: CountdownEnvConfig) -> TestActor {
        Actor::build(
            id,
            config,
            env,
            model_config(),
            f.buffer.clone(),
            f.publisher.source(),
            f.stop.clone(),
            f.progress.clone(),
            f.recorder.clone(),
        )
    }

    fn config() -> ActorConfig {
        ActorConfig::default()
            .n_step(1)
            .discount(0.99)
            .max_episodes(1)
            .schedule(EpisodeSchedule {
                max_episode_steps: 100,
                ..Default::default()
            })
    }

    #[test]
    fn test_single_episode_transitions() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default().episode_len(5);
        let stat = actor(0, &f, config(), env.clone()).run()?;

        assert_eq!(stat.episodes, 1);
        assert_eq!(stat.env_steps, 5);
        assert_eq!(stat.transitions, 5);

        let contents = f.buffer.contents();
        assert_eq!(contents.len(), 5);
        let masks: Vec<u8> = contents.iter().map(|tr| tr.continue_mask()).collect();
        assert_eq!(masks, vec![1, 1, 1, 1, 0]);
        assert!(contents.iter().all(|tr| tr.n_step_return() == 1.0));
        assert_eq!(env.n_built.load(Ordering::SeqCst), 1);
        assert_eq!(env.n_closed.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn test_partial_window_is_discarded() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default().episode_len(5);
        let config = config().n_step(3).discount(0.5).max_episodes(2);
        let stat = actor(0, &f, config, env).run()?;

        // 5 steps with a window of 3 emit 3 transitions per episode.
        assert_eq!(stat.transitions, 6);
        let contents = f.buffer.contents();
        assert_eq!(contents.len(), 6);
        for tr in contents.iter() {
            assert_eq!(tr.n_step_return(), 1.0 + 0.5 + 0.25);
        }
        let masks: Vec<u8> = contents.iter().map(|tr| tr.continue_mask()).collect();
        assert_eq!(masks, vec![1, 1, 0, 1, 1, 0]);
        Ok(())
    }

    #[test]
    fn test_step_cap_truncates_episode() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default().episode_len(50);
        let config = config().max_episodes(3).schedule(EpisodeSchedule {
            max_episode_steps: 4,
            elongation_increment: 1,
            elongation_block: 1,
            ..Default::default()
        });
        let stat = actor(0, &f, config, env).run()?;

        // Caps are 4, 5 and 6; truncated episodes never end with mask 0.
        assert_eq!(stat.env_steps, 4 + 5 + 6);
        assert!(f.buffer.contents().iter().all(|tr| tr.continue_mask() == 1));
        Ok(())
    }

    #[test]
    fn test_records_only_for_actor_zero() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default();
        actor(1, &f, config().max_episodes(2), env.clone()).run()?;
        assert!(f.recorder.lock().unwrap().is_empty());

        actor(0, &f, config().max_episodes(2), env.clone()).run()?;
        actor(2, &f, config().record_all_workers(true), env).run()?;
        let recorder = f.recorder.lock().unwrap();
        assert_eq!(recorder.len(), 3);
        let first = recorder.iter().next().unwrap();
        assert_eq!(first.get_scalar("episode_reward")?, 5.0);
        assert_eq!(first.get_scalar("episode_steps")?, 5.0);
        Ok(())
    }

    #[test]
    fn test_bad_params_end_actor_and_close_env() -> Result<()> {
        let mut f = fixture();
        let env = CountdownEnvConfig::default();
        let config = config().max_episodes(2).refresh_interval(1);

        f.publisher.publish(vec![0.0; 1], 1);
        assert!(actor(0, &f, config, env.clone()).run().is_err());
        assert_eq!(env.n_built.load(Ordering::SeqCst), 1);
        assert_eq!(env.n_closed.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn test_env_failure_is_isolated() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default()
            .episode_len(5)
            .inject_failures(2, 2);
        let stat = actor(0, &f, config().max_episodes(5), env.clone()).run()?;

        // The first two episodes fail and still count toward the limit.
        assert_eq!(stat.episodes, 3);
        assert_eq!(stat.failed_episodes, 2);
        assert_eq!(f.progress.episodes(), 3);
        assert_eq!(env.n_built.load(Ordering::SeqCst), 3);
        assert_eq!(env.n_closed.load(Ordering::SeqCst), 3);
        // Failed episodes pushed 2 transitions each before failing.
        assert_eq!(f.buffer.len(), 3 * 5 + 2 * 2);
        Ok(())
    }

    #[test]
    fn test_always_failing_env_ends_at_episode_limit() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default().inject_failures(0, usize::MAX);
        let actor = actor(0, &f, config().max_episodes(3), env.clone());
        let handle = thread::spawn(move || actor.run());

        let start = std::time::Instant::now();
        while !handle.is_finished() {
            assert!(start.elapsed() < Duration::from_secs(10), "actor did not finish");
            thread::sleep(Duration::from_millis(5));
        }
        let stat = handle.join().unwrap()?;

        assert_eq!(stat.episodes, 0);
        assert_eq!(stat.failed_episodes, 3);
        assert_eq!(stat.env_steps, 0);
        assert!(f.buffer.is_empty());
        // No rebuild after the last failed episode.
        assert_eq!(env.n_built.load(Ordering::SeqCst), 3);
        assert_eq!(env.n_closed.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[test]
    fn test_large_seed_wraps() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default().inject_failures(1, 1);
        let stat = actor(3, &f, config().max_episodes(2).seed(u64::MAX), env).run()?;
        assert_eq!(stat.episodes, 1);
        assert_eq!(stat.failed_episodes, 1);
        Ok(())
    }

    #[test]
    fn test_stop_bounds_completed_episodes() -> Result<()> {
        let f = fixture();
        let env = CountdownEnvConfig::default()
            .episode_len(10)
            .step_delay(Duration::from_millis(2));
        let actor = actor(0, &f, config().max_episodes(1_000_000), env.clone());
        let handle = thread::spawn(move || actor.run());

        while f.progress.episodes() < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        let at_signal = f.progress.episodes();
        f.stop.raise();
        let stat = handle.join().unwrap()?;

        assert!(stat.episodes <= at_signal + 1);
        assert_eq!(env.n_closed.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
