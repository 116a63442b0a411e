//! Rendering core: renderer-agnostic instanced cylinder pipeline.
//!
//! # Invariants
//! - The per-frame update is a pure function of time, the instance field and
//!   the render context; it allocates nothing.
//! - The instance buffer is only written while mapped through a [`BufferLock`],
//!   and a draw is never submitted while it is still mapped.
//! - One indexed, instanced draw call per frame.
//!
//! Backends implement [`GraphicsDevice`]. [`RecordingDevice`] is a headless
//! backend that logs every command, used by tests and the CLI.

mod clock;
mod context;
mod device;
mod orchestrator;
mod record;
mod recording;
mod updater;

pub use clock::{FixedClock, SystemClock, TimeSource};
pub use context::{OrbitCamera, RenderContext};
pub use device::{
    AttributeFormat, BufferLock, ClearValues, DepthCompare, DrawCall, GraphicsDevice,
    INSTANCE_SCHEMA, InstanceStorage, MESH_SCHEMA, RenderError, RenderResult, RenderState,
    ShaderSource, UpdateFrequency, VertexAttribute, VertexSchema,
};
pub use orchestrator::{FrameStats, RenderOrchestrator};
pub use record::InstanceRecord;
pub use recording::{
    DeviceCommand, RecordedBuffer, RecordedInstances, RecordedProgram, RecordingDevice,
};
pub use updater::{FrameTransforms, update_transforms};

pub fn crate_info() -> &'static str {
    "cylgrid-render v0.1.0"
}
