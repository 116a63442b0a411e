//! wgpu backend for the instanced cylinder pipeline.
//!
//! # Invariants
//! - Instance records are staged on the CPU while mapped and uploaded with a
//!   single queue write on unmap; the GPU never sees a half-written frame.
//! - A lost or outdated surface is reconfigured and the frame skipped.

mod gpu;
mod shaders;

pub use gpu::{WgpuDevice, WgpuInstances, WgpuProgram, vertex_attributes};
pub use shaders::{FRAGMENT_ENTRY, FRAGMENT_SHADER, VERTEX_ENTRY, VERTEX_SHADER, builtin_shaders};
