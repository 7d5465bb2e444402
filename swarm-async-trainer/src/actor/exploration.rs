use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::PI;

/// Clips raw actions into a box and perturbs them with Gaussian noise.
///
/// The noise is added after clipping, so the returned action can lie outside
/// `[low, high]`.
pub struct Exploration {
    low: f32,
    high: f32,
    rng: StdRng,
}

impl Exploration {
    /// Constructs the exploration with a seeded generator.
    pub fn new(low: f32, high: f32, seed: u64) -> Self {
        Self {
            low,
            high,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns `clip(raw, low, high) + scale * N(0, 1)` elementwise.
    pub fn perturb(&mut self, raw: Vec<f32>, scale: f32) -> Vec<f32> {
        raw.into_iter()
            .map(|a| a.max(self.low).min(self.high) + scale * self.standard_normal())
            .collect()
    }

    // Box-Muller transform
    fn standard_normal(&mut self) -> f32 {
        let u1: f32 = 1.0 - self.rng.gen::<f32>();
        let u2: f32 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}
