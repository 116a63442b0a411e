use std::collections::HashMap;

use glam::Vec3;

/// Errors raised while generating or validating a mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("a cylinder needs at least {min} sections, got {sections}")]
    TooFewSections { sections: u32, min: u32 },
    #[error("{name} must be finite and positive, got {value}")]
    InvalidDimension { name: &'static str, value: f32 },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
}

/// Vertex positions plus a triangle list (three indices per triangle).
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

/// Bit pattern of a position, with -0.0 folded into +0.0.
type PositionKey = [u32; 3];

fn key(p: Vec3) -> PositionKey {
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}

impl Mesh {
    pub(crate) fn from_parts(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Positions as raw bytes for upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    fn triangle_positions(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles().map(|[a, b, c]| {
            [
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            ]
        })
    }

    /// Check that indices form whole triangles and stay in range.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(self.indices.len()));
        }
        let vertex_count = self.positions.len();
        match self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            Some(&index) => Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    /// Undirected edges not shared by exactly two triangles.
    ///
    /// Edges are compared by position, so duplicated vertices at the same
    /// location count as the same corner. Call only on a validated mesh.
    pub fn boundary_edges(&self) -> Vec<[Vec3; 2]> {
        let mut edges: HashMap<(PositionKey, PositionKey), ([Vec3; 2], usize)> = HashMap::new();
        for [a, b, c] in self.triangle_positions() {
            for (p, q) in [(a, b), (b, c), (c, a)] {
                let (kp, kq) = (key(p), key(q));
                let k = if kp <= kq { (kp, kq) } else { (kq, kp) };
                edges.entry(k).or_insert(([p, q], 0)).1 += 1;
            }
        }
        edges
            .into_values()
            .filter(|(_, count)| *count != 2)
            .map(|(edge, _)| edge)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.boundary_edges().is_empty()
    }

    /// True when every directed edge occurs once and its reverse occurs once,
    /// i.e. neighbouring triangles agree on winding.
    pub fn is_consistently_oriented(&self) -> bool {
        let mut directed: HashMap<(PositionKey, PositionKey), usize> = HashMap::new();
        for [a, b, c] in self.triangle_positions() {
            for (p, q) in [(a, b), (b, c), (c, a)] {
                *directed.entry((key(p), key(q))).or_default() += 1;
            }
        }
        directed
            .iter()
            .all(|(&(p, q), &count)| count == 1 && directed.get(&(q, p)) == Some(&1))
    }

    /// Enclosed volume; positive when triangles wind outward.
    pub fn signed_volume(&self) -> f32 {
        self.triangle_positions()
            .map(|[a, b, c]| a.dot(b.cross(c)))
            .sum::<f32>()
            / 6.0
    }
}
