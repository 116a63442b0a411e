//! Instance field: one record per grid cell.
//!
//! # Invariants
//! - Static data (position, color) is written once at construction.
//! - The grid is centered on the origin for both even and odd sizes.
//! - A fixed seed reproduces the same colors on every run.

mod field;
mod grid;
mod tint;

pub use field::{FieldError, InstanceField, InstanceStatic, vertical_offset};
pub use grid::{GridCell, grid_positions};
pub use tint::{TintSampler, wall_clock_seed};

pub fn crate_info() -> &'static str {
    "cylgrid-field v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("field"));
    }
}
