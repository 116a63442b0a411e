use cylgrid_common::SceneConfig;
use cylgrid_field::InstanceField;
use cylgrid_mesh::{Mesh, generate_cylinder};
use glam::Vec3;

use crate::context::RenderContext;
use crate::device::{
    BufferLock, ClearValues, DrawCall, GraphicsDevice, INSTANCE_SCHEMA, MESH_SCHEMA,
    RenderError, RenderResult, RenderState, ShaderSource,
};
use crate::updater::update_transforms;

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub time: f32,
    pub instance_count: u32,
    pub index_count: u32,
    pub camera_position: Vec3,
}

/// Owns the shared mesh, the GPU resources and the instance field, and drives
/// one frame at a time: update transforms under the buffer lock, then a
/// single instanced draw.
pub struct RenderOrchestrator<D: GraphicsDevice> {
    device: D,
    context: RenderContext,
    field: InstanceField,
    mesh: Mesh,
    program: D::Program,
    vertices: D::VertexBuffer,
    indices: D::IndexBuffer,
    instances: D::InstanceBuffer,
    clear: ClearValues,
    index_count: u32,
    instance_count: u32,
    frame_index: u64,
}

impl<D: GraphicsDevice> RenderOrchestrator<D> {
    /// Build the mesh and instance field described by `config` and upload
    /// them. Invalid mesh or grid parameters fail before any buffer exists.
    pub fn from_config(device: D, config: &SceneConfig, shaders: &ShaderSource) -> RenderResult<Self> {
        let cyl = &config.cylinder;
        let mesh = generate_cylinder(cyl.height, cyl.radius, cyl.sections)?;
        let field = InstanceField::new(config.grid, config.tint)?;
        let context = RenderContext::from_config(config);
        Self::new(
            device,
            mesh,
            field,
            context,
            shaders,
            ClearValues::new(config.clear_color.0),
        )
    }

    pub fn new(
        mut device: D,
        mesh: Mesh,
        field: InstanceField,
        context: RenderContext,
        shaders: &ShaderSource,
        clear: ClearValues,
    ) -> RenderResult<Self> {
        mesh.validate()?;
        let index_count = u32::try_from(mesh.index_count())
            .map_err(|_| RenderError::BufferCreation("index count exceeds u32".into()))?;
        let instance_count = u32::try_from(field.len())
            .map_err(|_| RenderError::BufferCreation("instance count exceeds u32".into()))?;

        let vertices = device.create_vertex_buffer(mesh.positions(), &MESH_SCHEMA)?;
        let indices = device.create_index_buffer(mesh.indices())?;
        let mut instances = device.create_instance_buffer(field.len(), &INSTANCE_SCHEMA)?;

        // Colors are written once; the matrices are filled every frame.
        {
            let mut lock = BufferLock::acquire(&mut instances)?;
            for (record, instance) in lock.iter_mut().zip(field.instances()) {
                record.color = instance.color.to_array();
            }
        }

        let program = device.create_program(
            shaders,
            [&MESH_SCHEMA, &INSTANCE_SCHEMA],
            RenderState::default(),
        )?;

        tracing::info!(
            vertices = mesh.vertex_count(),
            indices = index_count,
            instances = instance_count,
            "render pipeline ready"
        );

        Ok(Self {
            device,
            context,
            field,
            mesh,
            program,
            vertices,
            indices,
            instances,
            clear,
            index_count,
            instance_count,
            frame_index: 0,
        })
    }

    /// Render one frame for elapsed time `t` (seconds).
    pub fn frame(&mut self, t: f32) -> RenderResult<FrameStats> {
        let transforms = {
            let mut lock = BufferLock::acquire(&mut self.instances)?;
            update_transforms(&self.context, t, &mut self.field, &mut lock)
        };

        // The lock is gone here; `submit` itself refuses a mapped buffer.
        self.device.submit(&DrawCall {
            clear: self.clear,
            program: &self.program,
            vertices: &self.vertices,
            instances: &self.instances,
            indices: &self.indices,
            index_count: self.index_count,
            instance_count: self.instance_count,
        })?;

        let stats = FrameStats {
            frame_index: self.frame_index,
            time: t,
            instance_count: self.instance_count,
            index_count: self.index_count,
            camera_position: transforms.camera_position,
        };
        self.frame_index += 1;
        tracing::trace!(frame = stats.frame_index, t, "frame submitted");
        Ok(stats)
    }

    /// Rebuild the projection for a new surface aspect ratio.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.context.set_aspect(aspect);
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn field(&self) -> &InstanceField {
        &self.field
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn instances(&self) -> &D::InstanceBuffer {
        &self.instances
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    pub fn into_device(self) -> D {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::InstanceStorage;
    use crate::recording::{DeviceCommand, RecordingDevice};
    use cylgrid_common::TintConfig;

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.grid.count_x = 3;
        config.grid.count_z = 2;
        config.cylinder.sections = 5;
        config.tint = TintConfig {
            seed: Some(4),
            ..TintConfig::default()
        };
        config
    }

    fn shaders() -> ShaderSource {
        ShaderSource::new("vs", "fs")
    }

    #[test]
    fn setup_creates_resources_in_order() {
        let orch =
            RenderOrchestrator::from_config(RecordingDevice::new(), &small_config(), &shaders())
                .unwrap();
        let cmds = orch.device().commands();
        assert!(matches!(cmds[0], DeviceCommand::CreateVertexBuffer { vertices: 22, stride: 12 }));
        assert!(matches!(cmds[1], DeviceCommand::CreateIndexBuffer { indices: 60 }));
        assert!(matches!(cmds[2], DeviceCommand::CreateInstanceBuffer { capacity: 6, stride: 76 }));
        assert!(matches!(cmds[3], DeviceCommand::CreateProgram { .. }));
        assert_eq!(orch.device().draw_count(), 0);
    }

    #[test]
    fn colors_uploaded_once_at_startup() {
        let mut orch =
            RenderOrchestrator::from_config(RecordingDevice::new(), &small_config(), &shaders())
                .unwrap();
        let expected: Vec<[f32; 3]> =
            orch.field().instances().iter().map(|i| i.color.to_array()).collect();
        orch.frame(0.0).unwrap();
        orch.frame(1.0).unwrap();
        let colors: Vec<[f32; 3]> = orch.device().last_frame().iter().map(|r| r.color).collect();
        assert_eq!(colors, expected);
        assert_eq!(orch.instances().map_count(), 3);
    }

    #[test]
    fn one_draw_per_frame_with_all_instances() {
        let mut orch =
            RenderOrchestrator::from_config(RecordingDevice::new(), &small_config(), &shaders())
                .unwrap();
        for i in 0..4 {
            let stats = orch.frame(i as f32 * 0.1).unwrap();
            assert_eq!(stats.frame_index, i);
            assert_eq!(stats.instance_count, 6);
            assert_eq!(stats.index_count, 60);
        }
        assert_eq!(orch.device().draw_count(), 4);
        assert_eq!(orch.frames_rendered(), 4);
        assert!(!orch.instances().is_mapped());
    }

    #[test]
    fn too_few_sections_fail_before_any_buffer() {
        let mut config = small_config();
        config.cylinder.sections = 2;
        let err = RenderOrchestrator::from_config(RecordingDevice::new(), &config, &shaders())
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Mesh(_)));
    }

    #[test]
    fn bad_tint_fails_before_any_buffer() {
        for (jitter_steps, divisor) in [(-1, 500.0), (100, 0.0)] {
            let mut config = small_config();
            config.tint.jitter_steps = jitter_steps;
            config.tint.divisor = divisor;
            let err = RenderOrchestrator::from_config(RecordingDevice::new(), &config, &shaders())
                .err()
                .unwrap();
            assert!(matches!(
                err,
                RenderError::Field(cylgrid_field::FieldError::InvalidTint { .. })
            ));
        }
    }

    #[test]
    fn map_failure_propagates() {
        let device = RecordingDevice::new().with_map_failure();
        let err = RenderOrchestrator::from_config(device, &small_config(), &shaders())
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::BufferMap(_)));
    }

    #[test]
    fn shader_failure_propagates() {
        let err = RenderOrchestrator::from_config(
            RecordingDevice::new(),
            &small_config(),
            &ShaderSource::new("", "fs"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RenderError::ShaderCompilation(_)));
    }

    #[test]
    fn aspect_change_reaches_the_matrices() {
        let mut orch =
            RenderOrchestrator::from_config(RecordingDevice::new(), &small_config(), &shaders())
                .unwrap();
        orch.frame(0.0).unwrap();
        let before = orch.device().last_frame().to_vec();
        orch.set_aspect(2.5);
        orch.frame(0.0).unwrap();
        assert_ne!(orch.device().last_frame(), before.as_slice());
        assert_eq!(orch.context().aspect(), 2.5);
    }
}
