//! Mesh generation: positions plus a flat triangle index list.
//!
//! # Invariants
//! - Every index emitted by [`MeshBuilder`] refers to a vertex that already exists.
//! - Generated cylinders are closed over vertex positions: rim vertices are
//!   duplicated per section, but seam positions are bit-identical copies.
//! - Triangles wind counter-clockwise when seen from outside the solid.

mod builder;
mod cylinder;
mod mesh;

pub use builder::{MeshBuilder, VertexIndex};
pub use cylinder::{
    MIN_SECTIONS, cylinder_index_count, cylinder_vertex_count, generate_cylinder, rim_point,
};
pub use mesh::{Mesh, MeshError};

pub fn crate_info() -> &'static str {
    "cylgrid-mesh v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("mesh"));
    }
}
