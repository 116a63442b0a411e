//! Contracts the pipeline needs from a graphics backend.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use cylgrid_common::Rgb;
use cylgrid_field::FieldError;
use cylgrid_mesh::MeshError;
use glam::Vec3;

use crate::record::InstanceRecord;

/// Errors from setting up or driving a graphics backend.
///
/// Construction errors come first; everything after is reported by the
/// backend and treated as fatal by the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),
    #[error("instance field error: {0}")]
    Field(#[from] FieldError),
    #[error("failed to read shader {path}: {source}")]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create buffer: {0}")]
    BufferCreation(String),
    #[error("failed to map instance buffer: {0}")]
    BufferMap(String),
    #[error("draw submitted while the instance buffer is still mapped")]
    BufferMapped,
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("graphics device lost")]
    DeviceLost,
    #[error("out of GPU memory")]
    OutOfMemory,
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Per-attribute data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    Float3,
    Float4x4,
}

impl AttributeFormat {
    pub fn size(self) -> u64 {
        match self {
            Self::Float3 => 12,
            Self::Float4x4 => 64,
        }
    }

    /// Shader input locations the attribute occupies.
    pub fn locations(self) -> u32 {
        match self {
            Self::Float3 => 1,
            Self::Float4x4 => 4,
        }
    }
}

/// How often a buffer's contents advance: per vertex of static geometry, or
/// once per drawn instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFrequency {
    Static,
    PerInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub format: AttributeFormat,
}

/// Layout of one vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexSchema {
    pub attributes: &'static [VertexAttribute],
    pub frequency: UpdateFrequency,
}

/// Shared mesh geometry: one position per vertex.
pub const MESH_SCHEMA: VertexSchema = VertexSchema {
    attributes: &[VertexAttribute {
        name: "pos",
        format: AttributeFormat::Float3,
    }],
    frequency: UpdateFrequency::Static,
};

/// Per-instance data: the MVP matrix followed by the color.
pub const INSTANCE_SCHEMA: VertexSchema = VertexSchema {
    attributes: &[
        VertexAttribute {
            name: "m",
            format: AttributeFormat::Float4x4,
        },
        VertexAttribute {
            name: "col",
            format: AttributeFormat::Float3,
        },
    ],
    frequency: UpdateFrequency::PerInstance,
};

impl VertexSchema {
    pub fn stride(&self) -> u64 {
        self.attributes.iter().map(|a| a.format.size()).sum()
    }

    /// Byte offset of every attribute, in declaration order.
    pub fn offsets(&self) -> impl Iterator<Item = (VertexAttribute, u64)> + '_ {
        self.attributes.iter().scan(0u64, |offset, attr| {
            let at = *offset;
            *offset += attr.format.size();
            Some((*attr, at))
        })
    }

    pub fn location_count(&self) -> u32 {
        self.attributes.iter().map(|a| a.format.locations()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCompare {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Fixed-function state bound with the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub depth_test: bool,
    pub depth_compare: DepthCompare,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_compare: DepthCompare::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValues {
    pub color: Rgb,
    pub depth: f32,
}

impl ClearValues {
    pub fn new(color: Rgb) -> Self {
        Self { color, depth: 1.0 }
    }
}

/// Vertex and fragment shader source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub const VERTEX_FILE: &'static str = "cylinder.vert.wgsl";
    pub const FRAGMENT_FILE: &'static str = "cylinder.frag.wgsl";

    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read `cylinder.vert.wgsl` and `cylinder.frag.wgsl` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> RenderResult<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| RenderError::ShaderIo { path, source })
        };
        let source = Self {
            vertex: read(Self::VERTEX_FILE)?,
            fragment: read(Self::FRAGMENT_FILE)?,
        };
        tracing::info!("loaded shaders from {}", dir.display());
        Ok(source)
    }
}

/// CPU access to the per-instance buffer.
///
/// `map` grants write access until `unmap`; the GPU must not read the
/// contents in between. Prefer [`BufferLock`] over calling these directly.
pub trait InstanceStorage {
    fn capacity(&self) -> usize;
    fn map(&mut self) -> RenderResult<()>;
    /// Mapped records; empty while unmapped.
    fn mapped(&self) -> &[InstanceRecord];
    /// Mapped records; empty while unmapped.
    fn mapped_mut(&mut self) -> &mut [InstanceRecord];
    fn unmap(&mut self);
    fn is_mapped(&self) -> bool;
}

/// Scoped mapping of an [`InstanceStorage`]. Unmaps on drop, including when
/// the writer returns early or panics.
pub struct BufferLock<'a, S: InstanceStorage + ?Sized> {
    storage: &'a mut S,
}

impl<'a, S: InstanceStorage + ?Sized> BufferLock<'a, S> {
    pub fn acquire(storage: &'a mut S) -> RenderResult<Self> {
        storage.map()?;
        Ok(Self { storage })
    }
}

impl<S: InstanceStorage + ?Sized> Deref for BufferLock<'_, S> {
    type Target = [InstanceRecord];

    fn deref(&self) -> &Self::Target {
        self.storage.mapped()
    }
}

impl<S: InstanceStorage + ?Sized> DerefMut for BufferLock<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.storage.mapped_mut()
    }
}

impl<S: InstanceStorage + ?Sized> Drop for BufferLock<'_, S> {
    fn drop(&mut self) {
        self.storage.unmap();
    }
}

/// Everything one frame's draw needs: clear, bind, draw, present.
pub struct DrawCall<'a, D: GraphicsDevice + ?Sized> {
    pub clear: ClearValues,
    pub program: &'a D::Program,
    pub vertices: &'a D::VertexBuffer,
    pub instances: &'a D::InstanceBuffer,
    pub indices: &'a D::IndexBuffer,
    pub index_count: u32,
    pub instance_count: u32,
}

/// A graphics backend able to run the instanced cylinder pipeline.
pub trait GraphicsDevice {
    type VertexBuffer;
    type IndexBuffer;
    type InstanceBuffer: InstanceStorage;
    type Program;

    /// Static geometry laid out as `schema`.
    fn create_vertex_buffer(
        &mut self,
        positions: &[Vec3],
        schema: &VertexSchema,
    ) -> RenderResult<Self::VertexBuffer>;

    fn create_index_buffer(&mut self, indices: &[u32]) -> RenderResult<Self::IndexBuffer>;

    /// Zero-filled per-instance buffer with room for `capacity` records.
    fn create_instance_buffer(
        &mut self,
        capacity: usize,
        schema: &VertexSchema,
    ) -> RenderResult<Self::InstanceBuffer>;

    /// Compile and link against the mesh and instance layouts, in that order.
    fn create_program(
        &mut self,
        shaders: &ShaderSource,
        layouts: [&VertexSchema; 2],
        state: RenderState,
    ) -> RenderResult<Self::Program>;

    /// Clear, bind both vertex buffers and the index buffer, issue one indexed
    /// instanced draw and present.
    fn submit(&mut self, draw: &DrawCall<'_, Self>) -> RenderResult<()>;
}
