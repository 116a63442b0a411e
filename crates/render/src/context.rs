use cylgrid_common::{CameraConfig, SceneConfig};
use glam::{Mat3, Mat4, Vec3};

/// Camera circling the vertical axis at a fixed rate, always looking at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Position at `t = 0`.
    pub start: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Radians per second around +Y.
    pub orbit_rate: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            start: config.start,
            target: config.target,
            up: config.up,
            orbit_rate: config.orbit_rate,
        }
    }

    pub fn position(&self, t: f32) -> Vec3 {
        Mat3::from_rotation_y(t * self.orbit_rate) * self.start
    }

    pub fn view_from(&self, position: Vec3) -> Mat4 {
        Mat4::look_at_rh(position, self.target, self.up)
    }

    pub fn view_matrix(&self, t: f32) -> Mat4 {
        self.view_from(self.position(t))
    }
}

/// Camera plus the projection fixed at startup. Passed explicitly into every
/// frame update instead of living in process-wide state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub camera: OrbitCamera,
    fov_y: f32,
    near: f32,
    far: f32,
    aspect: f32,
    projection: Mat4,
}

impl RenderContext {
    pub fn new(camera: &CameraConfig, aspect: f32) -> Self {
        Self {
            camera: OrbitCamera::from_config(camera),
            fov_y: camera.fov_y,
            near: camera.near,
            far: camera.far,
            aspect,
            projection: Mat4::perspective_rh(camera.fov_y, aspect, camera.near, camera.far),
        }
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(&config.camera, config.window.aspect())
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Rebuild the projection after a surface resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
    }

    /// Camera position and `projection * view` at time `t`.
    pub fn view_projection(&self, t: f32) -> (Vec3, Mat4) {
        let position = self.camera.position(t);
        (position, self.projection * self.camera.view_from(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_starts_at_configured_position() {
        let cam = OrbitCamera::default();
        assert_eq!(cam.position(0.0), Vec3::new(0.0, 7.5, 5.0));
    }

    #[test]
    fn camera_orbits_a_quarter_turn() {
        let cam = OrbitCamera::default();
        // t/4 = pi/2 after 2*pi seconds: +Z rotates onto +X.
        let p = cam.position(std::f32::consts::TAU);
        assert!(p.abs_diff_eq(Vec3::new(5.0, 7.5, 0.0), 1e-5), "{p}");
    }

    #[test]
    fn orbit_keeps_height_and_radius() {
        let cam = OrbitCamera::default();
        for t in [0.3, 1.7, 12.0, 100.0] {
            let p = cam.position(t);
            assert!((p.y - 7.5).abs() < 1e-5);
            assert!((p.x.hypot(p.z) - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let ctx = RenderContext::from_config(&SceneConfig::default());
        for t in [0.0, 3.0, 9.5] {
            let (_, vp) = ctx.view_projection(t);
            let clip = vp * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn resize_rebuilds_projection() {
        let mut ctx = RenderContext::from_config(&SceneConfig::default());
        let before = ctx.projection();
        ctx.set_aspect(2.0);
        assert_ne!(ctx.projection(), before);
        assert_eq!(
            ctx.projection(),
            Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 2.0, 0.1, 100.0)
        );
    }

    #[test]
    fn view_projection_matches_manual_product() {
        let ctx = RenderContext::from_config(&SceneConfig::default());
        let (pos, vp) = ctx.view_projection(1.25);
        assert_eq!(pos, ctx.camera.position(1.25));
        assert_eq!(vp, ctx.projection() * ctx.camera.view_matrix(1.25));
    }
}
