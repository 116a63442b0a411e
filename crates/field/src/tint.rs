use std::time::{SystemTime, UNIX_EPOCH};

use cylgrid_common::{Rgb, TintConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Draws per-instance colors: the base tint with one channel shifted by a
/// uniform step in `[-jitter_steps, jitter_steps] / divisor`.
pub struct TintSampler {
    rng: ChaCha8Rng,
    config: TintConfig,
}

impl TintSampler {
    pub fn new(config: TintConfig, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    pub fn sample(&mut self) -> Rgb {
        let steps = self.config.jitter_steps;
        let k = self.rng.gen_range(-steps..=steps);
        let base = self.config.base;
        let channel = self.config.channel;
        base.with_channel(channel, base.channel(channel) + k as f32 / self.config.divisor)
    }
}

/// Milliseconds since the Unix epoch, used when no fixed seed is configured.
pub fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
