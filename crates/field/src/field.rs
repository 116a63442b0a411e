use cylgrid_common::{GridConfig, Rgb, TintConfig};
use glam::Vec3;

use crate::grid::{GridCell, cells};
use crate::tint::{TintSampler, wall_clock_seed};

/// Errors from building an instance field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("grid {count_x}x{count_z} has no cells")]
    EmptyGrid { count_x: u32, count_z: u32 },
    #[error("grid {count_x}x{count_z} exceeds the u32 instance limit")]
    TooManyInstances { count_x: u32, count_z: u32 },
    #[error("tint jitter of {jitter_steps} steps over divisor {divisor} is invalid")]
    InvalidTint { jitter_steps: i32, divisor: f32 },
}

/// Data fixed at startup for one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceStatic {
    pub cell: GridCell,
    /// Base position; `y` is always 0.
    pub position: Vec3,
    pub color: Rgb,
}

/// All instances of the grid, plus their per-frame vertical offsets.
#[derive(Debug, Clone)]
pub struct InstanceField {
    count_x: u32,
    count_z: u32,
    seed: u64,
    statics: Vec<InstanceStatic>,
    offsets: Vec<f32>,
}

/// Bobbing height for an instance at `position` after `t` seconds.
pub fn vertical_offset(position: Vec3, t: f32) -> f32 {
    (position.x * 4.0 + position.z + t * 2.0).sin() / 4.0
}

impl InstanceField {
    /// Build from config, seeding colors from `tint.seed` or the wall clock.
    pub fn new(grid: GridConfig, tint: TintConfig) -> Result<Self, FieldError> {
        let seed = tint.seed.unwrap_or_else(wall_clock_seed);
        Self::with_seed(grid.count_x, grid.count_z, tint, seed)
    }

    pub fn with_seed(
        count_x: u32,
        count_z: u32,
        tint: TintConfig,
        seed: u64,
    ) -> Result<Self, FieldError> {
        if count_x == 0 || count_z == 0 {
            return Err(FieldError::EmptyGrid { count_x, count_z });
        }
        if count_x.checked_mul(count_z).is_none() {
            return Err(FieldError::TooManyInstances { count_x, count_z });
        }
        if tint.jitter_steps < 0 || tint.divisor == 0.0 || !tint.divisor.is_finite() {
            return Err(FieldError::InvalidTint {
                jitter_steps: tint.jitter_steps,
                divisor: tint.divisor,
            });
        }

        let mut sampler = TintSampler::new(tint, seed);
        let statics: Vec<InstanceStatic> = cells(count_x, count_z)
            .map(|cell| InstanceStatic {
                cell,
                position: cell.world_position(count_x, count_z),
                color: sampler.sample(),
            })
            .collect();
        let offsets = vec![0.0; statics.len()];

        tracing::info!(count_x, count_z, seed, "instance field initialized");
        Ok(Self {
            count_x,
            count_z,
            seed,
            statics,
            offsets,
        })
    }

    pub fn len(&self) -> usize {
        self.statics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statics.is_empty()
    }

    pub fn count_x(&self) -> u32 {
        self.count_x
    }

    pub fn count_z(&self) -> u32 {
        self.count_z
    }

    /// Seed the colors were drawn with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn instances(&self) -> &[InstanceStatic] {
        &self.statics
    }

    /// Offsets written by the last animation pass.
    pub fn offsets(&self) -> &[f32] {
        &self.offsets
    }

    /// Instance index of a grid cell.
    pub fn index_of(&self, cell: GridCell) -> Option<usize> {
        (cell.x < self.count_x && cell.z < self.count_z)
            .then(|| cell.x as usize * self.count_z as usize + cell.z as usize)
    }

    /// Static data paired with the mutable offset slot, in instance order.
    pub fn animation_slots(&mut self) -> impl Iterator<Item = (&InstanceStatic, &mut f32)> {
        self.statics.iter().zip(self.offsets.iter_mut())
    }
}
