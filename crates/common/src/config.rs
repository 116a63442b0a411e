use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::{Channel, Rgb};

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level scene description. Every section falls back to its default when
/// missing from the YAML document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub grid: GridConfig,
    pub cylinder: CylinderConfig,
    pub camera: CameraConfig,
    pub tint: TintConfig,
    pub clear_color: ClearColor,
}

/// Window title, size and initial screen position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Top-left corner in physical pixels.
    pub position: [i32; 2],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Instanced Rendering Example".into(),
            width: 1024,
            height: 768,
            position: [100, 100],
        }
    }
}

impl WindowConfig {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Number of cylinders along each horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub count_x: u32,
    pub count_z: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            count_x: 100,
            count_z: 100,
        }
    }
}

impl GridConfig {
    pub fn instance_count(&self) -> usize {
        self.count_x as usize * self.count_z as usize
    }
}

/// Shape of the shared cylinder mesh. Each section adds four triangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CylinderConfig {
    pub height: f32,
    pub radius: f32,
    pub sections: u32,
}

impl Default for CylinderConfig {
    fn default() -> Self {
        Self {
            height: 1.0,
            radius: 0.5,
            sections: 32,
        }
    }
}

/// Orbiting camera and its fixed projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position at `t = 0`.
    pub start: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Radians of orbit around +Y per second.
    pub orbit_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start: Vec3::new(0.0, 7.5, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: std::f32::consts::FRAC_PI_2,
            near: 0.1,
            far: 100.0,
            orbit_rate: 0.25,
        }
    }
}

/// Per-instance color: `base` with one channel shifted by
/// `k / divisor`, `k` uniform in `[-jitter_steps, jitter_steps]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TintConfig {
    pub base: Rgb,
    pub channel: Channel,
    pub jitter_steps: i32,
    pub divisor: f32,
    /// Fixed RNG seed. `None` seeds from the wall clock.
    pub seed: Option<u64>,
}

impl Default for TintConfig {
    fn default() -> Self {
        Self {
            base: Rgb::new(1.0, 0.75, 0.0),
            channel: Channel::Green,
            jitter_steps: 100,
            divisor: 500.0,
            seed: None,
        }
    }
}

impl TintConfig {
    /// Largest absolute deviation from the base channel value.
    pub fn max_jitter(&self) -> f32 {
        self.jitter_steps as f32 / self.divisor
    }
}

/// Framebuffer clear color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClearColor(pub Rgb);

impl Default for ClearColor {
    fn default() -> Self {
        Self(Rgb::from_argb(0xFFFF_BD00))
    }
}

impl SceneConfig {
    /// Load a YAML config from disk and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!("loaded scene config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that would fail later during mesh or buffer setup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }
        if self.grid.count_x == 0 || self.grid.count_z == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid {}x{} must contain at least one instance",
                self.grid.count_x, self.grid.count_z
            )));
        }
        if self.cylinder.sections < 3 {
            return Err(ConfigError::Invalid(format!(
                "cylinder needs at least 3 sections, got {}",
                self.cylinder.sections
            )));
        }
        if !(self.cylinder.height > 0.0 && self.cylinder.radius > 0.0) {
            return Err(ConfigError::Invalid(
                "cylinder height and radius must be positive".into(),
            ));
        }
        let cam = &self.camera;
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(ConfigError::Invalid(format!(
                "camera planes near={} far={} are out of order",
                cam.near, cam.far
            )));
        }
        if !(cam.fov_y > 0.0 && cam.fov_y < std::f32::consts::PI) {
            return Err(ConfigError::Invalid(format!(
                "field of view {} is outside (0, pi)",
                cam.fov_y
            )));
        }
        let tint = &self.tint;
        if tint.jitter_steps < 0 || tint.divisor == 0.0 || !tint.divisor.is_finite() {
            return Err(ConfigError::Invalid(
                "tint jitter must be non-negative with a non-zero divisor".into(),
            ));
        }
        Ok(())
    }
}
