//! Per-episode schedules of actors.
use serde::{Deserialize, Serialize};

/// Episode step cap and exploration noise as functions of the episode index.
///
/// * step cap: `max_episode_steps + elongation_increment * (i / elongation_block)`,
///   constant when `elongation_block == 0`.
/// * noise scale: `noise_scale * noise_decay ^ (i / noise_decay_block)`.
///
/// `i` is the 0-based index of the episode in one actor; divisions are integer
/// divisions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EpisodeSchedule {
    /// Step cap of the first episodes.
    pub max_episode_steps: usize,

    /// Steps added to the cap every `elongation_block` episodes.
    pub elongation_increment: usize,

    /// Number of episodes between two elongations. `0` disables elongation.
    pub elongation_block: usize,

    /// Noise scale of the first episodes.
    pub noise_scale: f32,

    /// Factor applied to the noise scale every `noise_decay_block` episodes.
    pub noise_decay: f32,

    /// Number of episodes between two decays.
    pub noise_decay_block: usize,
}

impl Default for EpisodeSchedule {
    fn default() -> Self {
        Self {
            max_episode_steps: 200,
            elongation_increment: 1,
            elongation_block: 0,
            noise_scale: 1.0,
            noise_decay: 0.99,
            noise_decay_block: 20,
        }
    }
}

impl EpisodeSchedule {
    /// Maximum number of environment steps in episode `i`.
    pub fn step_cap(&self, i: usize) -> usize {
        if self.elongation_block == 0 {
            self.max_episode_steps
        } else {
            self.max_episode_steps + self.elongation_increment * (i / self.elongation_block)
        }
    }

    /// Scale of the exploration noise in episode `i`.
    pub fn noise_scale(&self, i: usize) -> f32 {
        let block = self.noise_decay_block.max(1);
        self.noise_scale * self.noise_decay.powi((i / block) as i32)
    }
}
