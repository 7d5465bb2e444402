use std::time::Duration;

/// Stats of sampling process in each [Actor](crate::Actor).
#[derive(Clone, Debug, Default)]
pub struct ActorStat {
    /// Id of the actor.
    pub id: usize,

    /// The number of steps for interaction between agent and env.
    pub env_steps: usize,

    /// The number of completed episodes.
    pub episodes: usize,

    /// The number of transitions pushed into the replay buffer.
    pub transitions: usize,

    /// The number of episodes abandoned because the environment failed.
    pub failed_episodes: usize,

    /// Duration of sampling loop in [Actor](crate::Actor).
    pub duration: Duration,
}

/// Returns a formatted string of the set of [ActorStat] for reporting.
pub fn actor_stats_fmt(stats: &[ActorStat]) -> String {
    let mut s =
        "actor id, episodes, samples, transitions, failures, duration [sec], samples per sec\n"
            .to_string();
    for stat in stats.iter() {
        let n = stat.env_steps;
        let d = stat.duration.as_secs_f32();
        let p = if d > 0.0 { (n as f32) / d } else { 0.0 };
        s += format!(
            "{}, {}, {}, {}, {}, {}, {}\n",
            stat.id, stat.episodes, n, stat.transitions, stat.failed_episodes, d, p
        )
        .as_str();
    }
    s
}
