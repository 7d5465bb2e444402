use anyhow::Result;
use clap::Parser;
use log::info;
use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};
use swarm_async_trainer::{train_async, StopSignal, TrainConfig};
use swarm_core::{
    dummy::{LinearPolicy, LinearPolicyConfig, PointMassEnv, PointMassEnvConfig},
    record::LogRecorder,
    FileSaver, NullSaver, Saver,
};

/// Train a linear policy on the point-mass task with asynchronous actors
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration of the training run in YAML
    #[arg(long)]
    config: Option<String>,

    /// Number of actor threads
    #[arg(long)]
    n_actors: Option<usize>,

    /// Number of episodes per actor
    #[arg(long)]
    max_episodes: Option<usize>,

    /// Raises the stop signal after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Directory where parameters are saved
    #[arg(long)]
    model_dir: Option<String>,
}

fn train_config(args: &Args) -> Result<TrainConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => TrainConfig::load(path)?,
        None => TrainConfig::default(),
    };
    if let Some(n_actors) = args.n_actors {
        config = config.n_actors(n_actors);
    }
    if let Some(max_episodes) = args.max_episodes {
        config.actor.max_episodes = max_episodes;
    }
    if let Some(model_dir) = args.model_dir.as_ref() {
        config = config.model_dir(model_dir.as_str());
    }
    Ok(config)
}

fn train<S: Saver + Send + 'static>(
    config: &TrainConfig,
    saver: S,
    stop: Arc<StopSignal>,
) -> Result<()> {
    let env_config = PointMassEnvConfig::default();
    let model_config = LinearPolicyConfig {
        state_dim: 2,
        action_dim: 1,
        ..Default::default()
    };
    let report = train_async::<PointMassEnv, LinearPolicy, _, _>(
        config,
        &env_config,
        &model_config,
        Arc::new(Mutex::new(LogRecorder::new("train"))),
        Arc::new(Mutex::new(saver)),
        stop,
    )?;
    info!(
        "Finished: {} episodes, {} env steps, parameters of version {}",
        report.episodes,
        report.env_steps,
        report.snapshot.version()
    );
    Ok(())
}

fn on_interrupt(stop: &StopSignal) {
    info!("Interrupted, finishing in-flight episodes");
    stop.raise();
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = train_config(&args)?;
    let stop = Arc::new(StopSignal::new());

    {
        let stop = stop.clone();
        ctrlc::set_handler(move || on_interrupt(&stop))?;
    }

    if let Some(secs) = args.duration_secs {
        let stop = stop.clone();
        thread::spawn(move || {
            if !stop.wait_timeout(Duration::from_secs(secs)) {
                info!("Time limit of {} seconds reached", secs);
                stop.raise();
            }
        });
    }

    match config.model_dir.as_ref() {
        Some(model_dir) => train(&config, FileSaver::new(model_dir), stop),
        None => train(&config, NullSaver, stop),
    }
}
