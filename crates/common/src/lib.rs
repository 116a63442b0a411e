//! Shared configuration and value types for the cylinder grid workspace.
//!
//! # Invariants
//! - `SceneConfig::default()` reproduces the built-in scene exactly.
//! - A config that passes `validate()` never causes a construction error
//!   further down the pipeline.

mod config;
mod types;

pub use config::{
    CameraConfig, ClearColor, ConfigError, CylinderConfig, GridConfig, SceneConfig, TintConfig,
    WindowConfig,
};
pub use types::{Channel, Rgb};

pub fn crate_info() -> &'static str {
    "cylgrid-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
