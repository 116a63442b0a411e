use std::fmt;

use glam::Vec3;

use crate::device::{
    DrawCall, GraphicsDevice, InstanceStorage, RenderError, RenderResult, RenderState,
    ShaderSource, VertexSchema,
};
use crate::record::InstanceRecord;

/// One call made against a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateVertexBuffer { vertices: usize, stride: u64 },
    CreateIndexBuffer { indices: usize },
    CreateInstanceBuffer { capacity: usize, stride: u64 },
    CreateProgram { state: RenderState, locations: u32 },
    Draw { index_count: u32, instance_count: u32 },
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateVertexBuffer { vertices, stride } => {
                write!(f, "vertex buffer: {vertices} vertices, stride {stride}")
            }
            Self::CreateIndexBuffer { indices } => write!(f, "index buffer: {indices} indices"),
            Self::CreateInstanceBuffer { capacity, stride } => {
                write!(f, "instance buffer: {capacity} slots, stride {stride}")
            }
            Self::CreateProgram { state, locations } => write!(
                f,
                "program: {locations} input locations, depth test {} ({:?})",
                state.depth_test, state.depth_compare
            ),
            Self::Draw {
                index_count,
                instance_count,
            } => write!(f, "draw: {index_count} indices x {instance_count} instances"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBuffer {
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedProgram {
    pub state: RenderState,
}

/// CPU-side instance buffer that counts its mappings.
#[derive(Debug, Clone)]
pub struct RecordedInstances {
    records: Vec<InstanceRecord>,
    mapped: bool,
    map_count: usize,
    fail_map: bool,
}

impl RecordedInstances {
    /// How many times the buffer has been mapped.
    pub fn map_count(&self) -> usize {
        self.map_count
    }

    /// Contents regardless of mapping state.
    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }
}

impl InstanceStorage for RecordedInstances {
    fn capacity(&self) -> usize {
        self.records.len()
    }

    fn map(&mut self) -> RenderResult<()> {
        if self.fail_map {
            return Err(RenderError::BufferMap("injected map failure".into()));
        }
        self.mapped = true;
        self.map_count += 1;
        Ok(())
    }

    fn mapped(&self) -> &[InstanceRecord] {
        if self.mapped { &self.records } else { &[] }
    }

    fn mapped_mut(&mut self) -> &mut [InstanceRecord] {
        if self.mapped { &mut self.records } else { &mut [] }
    }

    fn unmap(&mut self) {
        self.mapped = false;
    }

    fn is_mapped(&self) -> bool {
        self.mapped
    }
}

/// Headless backend: records every command and keeps a copy of the instance
/// data consumed by the most recent draw.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
    last_frame: Vec<InstanceRecord>,
    fail_map: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every instance buffer created afterwards refuse to map.
    pub fn with_map_failure(mut self) -> Self {
        self.fail_map = true;
        self
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DeviceCommand::Draw { .. }))
            .count()
    }

    /// Instance records as seen by the last draw.
    pub fn last_frame(&self) -> &[InstanceRecord] {
        &self.last_frame
    }

    /// Human-readable log of all commands, one per line.
    pub fn transcript(&self) -> String {
        let mut out = format!("=== Device transcript ({} commands) ===\n", self.commands.len());
        for (i, cmd) in self.commands.iter().enumerate() {
            out.push_str(&format!("  [{i:>4}] {cmd}\n"));
        }
        out
    }
}

impl GraphicsDevice for RecordingDevice {
    type VertexBuffer = RecordedBuffer;
    type IndexBuffer = RecordedBuffer;
    type InstanceBuffer = RecordedInstances;
    type Program = RecordedProgram;

    fn create_vertex_buffer(
        &mut self,
        positions: &[Vec3],
        schema: &VertexSchema,
    ) -> RenderResult<RecordedBuffer> {
        self.commands.push(DeviceCommand::CreateVertexBuffer {
            vertices: positions.len(),
            stride: schema.stride(),
        });
        Ok(RecordedBuffer {
            len: positions.len(),
        })
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> RenderResult<RecordedBuffer> {
        self.commands.push(DeviceCommand::CreateIndexBuffer {
            indices: indices.len(),
        });
        Ok(RecordedBuffer { len: indices.len() })
    }

    fn create_instance_buffer(
        &mut self,
        capacity: usize,
        schema: &VertexSchema,
    ) -> RenderResult<RecordedInstances> {
        self.commands.push(DeviceCommand::CreateInstanceBuffer {
            capacity,
            stride: schema.stride(),
        });
        Ok(RecordedInstances {
            records: vec![InstanceRecord::default(); capacity],
            mapped: false,
            map_count: 0,
            fail_map: self.fail_map,
        })
    }

    fn create_program(
        &mut self,
        shaders: &ShaderSource,
        layouts: [&VertexSchema; 2],
        state: RenderState,
    ) -> RenderResult<RecordedProgram> {
        if shaders.vertex.trim().is_empty() || shaders.fragment.trim().is_empty() {
            return Err(RenderError::ShaderCompilation("empty shader source".into()));
        }
        self.commands.push(DeviceCommand::CreateProgram {
            state,
            locations: layouts.iter().map(|l| l.location_count()).sum(),
        });
        Ok(RecordedProgram { state })
    }

    fn submit(&mut self, draw: &DrawCall<'_, Self>) -> RenderResult<()> {
        if draw.instances.is_mapped() {
            return Err(RenderError::BufferMapped);
        }
        let count = draw.instance_count as usize;
        self.last_frame.clear();
        self.last_frame
            .extend_from_slice(&draw.instances.records()[..count.min(draw.instances.capacity())]);
        self.commands.push(DeviceCommand::Draw {
            index_count: draw.index_count,
            instance_count: draw.instance_count,
        });
        Ok(())
    }
}
