use glam::Vec3;

use crate::mesh::Mesh;

/// Index of a vertex inside the mesh being built.
///
/// Only [`MeshBuilder::push_vertex`] hands these out, so a triangle made of
/// `VertexIndex` values is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIndex(u32);

impl VertexIndex {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Append-only mesh assembly.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size both buffers so that building to the expected size never reallocates.
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn push_vertex(&mut self, position: Vec3) -> VertexIndex {
        let index = VertexIndex(self.positions.len() as u32);
        self.positions.push(position);
        index
    }

    pub fn push_triangle(&mut self, [a, b, c]: [VertexIndex; 3]) {
        self.indices.extend_from_slice(&[a.0, b.0, c.0]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn build(self) -> Mesh {
        Mesh::from_parts(self.positions, self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_push_order() {
        let mut b = MeshBuilder::new();
        let a = b.push_vertex(Vec3::ZERO);
        let c = b.push_vertex(Vec3::X);
        let d = b.push_vertex(Vec3::Z);
        assert_eq!((a.get(), c.get(), d.get()), (0, 1, 2));

        b.push_triangle([a, d, c]);
        let mesh = b.build();
        assert_eq!(mesh.indices(), &[0, 2, 1]);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn with_capacity_does_not_reallocate() {
        let mut b = MeshBuilder::with_capacity(3, 3);
        let v: Vec<_> = (0..3).map(|i| b.push_vertex(Vec3::splat(i as f32))).collect();
        b.push_triangle([v[0], v[1], v[2]]);
        assert_eq!(b.vertex_count(), 3);
        assert_eq!(b.index_count(), 3);
        let mesh = b.build();
        assert_eq!(mesh.positions().len(), 3);
    }
}
