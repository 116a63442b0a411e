//! Capped cylinder standing on the XZ plane, axis along +Y.
//!
//! Layout: vertex 0 is the bottom center, vertex 1 the top center, then four
//! vertices per section (bottom/top at the section's first angle, bottom/top
//! at its second angle). Rim vertices are not shared between sections.

use std::f32::consts::TAU;

use glam::{Mat3, Vec3};

use crate::builder::{MeshBuilder, VertexIndex};
use crate::mesh::{Mesh, MeshError};

/// Fewer sections would give a flat or self-intersecting solid.
pub const MIN_SECTIONS: u32 = 3;

pub fn cylinder_vertex_count(sections: u32) -> usize {
    2 + 4 * sections as usize
}

pub fn cylinder_index_count(sections: u32) -> usize {
    12 * sections as usize
}

/// Rim point at angle `i * 2π / sections`: the reference point `(0, 0, radius)`
/// rotated about +Y.
pub fn rim_point(radius: f32, i: u32, sections: u32) -> Vec3 {
    let angle = i as f32 * (TAU / sections as f32);
    Mat3::from_rotation_y(angle) * Vec3::new(0.0, 0.0, radius)
}

struct Centers {
    bottom: VertexIndex,
    top: VertexIndex,
}

/// Build a closed cylinder of `sections` radial slices.
pub fn generate_cylinder(height: f32, radius: f32, sections: u32) -> Result<Mesh, MeshError> {
    if sections < MIN_SECTIONS {
        return Err(MeshError::TooFewSections {
            sections,
            min: MIN_SECTIONS,
        });
    }
    for (name, value) in [("height", height), ("radius", radius)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(MeshError::InvalidDimension { name, value });
        }
    }

    let mut builder = MeshBuilder::with_capacity(
        cylinder_vertex_count(sections),
        cylinder_index_count(sections),
    );
    let centers = Centers {
        bottom: builder.push_vertex(Vec3::ZERO),
        top: builder.push_vertex(Vec3::new(0.0, height, 0.0)),
    };

    let first = Vec3::new(0.0, 0.0, radius);
    let mut last = first;
    for i in 1..sections {
        let next = rim_point(radius, i, sections);
        push_section(&mut builder, &centers, last, next, height);
        last = next;
    }
    // Close on the stored first point, not on a recomputed angle of 2π.
    push_section(&mut builder, &centers, last, first, height);

    debug_assert_eq!(builder.vertex_count(), cylinder_vertex_count(sections));
    debug_assert_eq!(builder.index_count(), cylinder_index_count(sections));
    tracing::debug!(
        sections,
        vertices = builder.vertex_count(),
        indices = builder.index_count(),
        "generated cylinder mesh"
    );
    Ok(builder.build())
}

fn push_section(builder: &mut MeshBuilder, centers: &Centers, last: Vec3, next: Vec3, height: f32) {
    let b0 = builder.push_vertex(Vec3::new(last.x, 0.0, last.z));
    let t0 = builder.push_vertex(Vec3::new(last.x, height, last.z));
    let b1 = builder.push_vertex(Vec3::new(next.x, 0.0, next.z));
    let t1 = builder.push_vertex(Vec3::new(next.x, height, next.z));

    builder.push_triangle([b0, b1, t0]);
    builder.push_triangle([t1, t0, b1]);
    builder.push_triangle([centers.bottom, b1, b0]);
    builder.push_triangle([t1, centers.top, t0]);
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 1.0;
    const R: f32 = 0.5;

    #[test]
    fn rejects_too_few_sections() {
        for sections in 0..MIN_SECTIONS {
            assert_eq!(
                generate_cylinder(H, R, sections),
                Err(MeshError::TooFewSections { sections, min: 3 })
            );
        }
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            generate_cylinder(0.0, R, 8),
            Err(MeshError::InvalidDimension { name: "height", .. })
        ));
        assert!(matches!(
            generate_cylinder(H, f32::NAN, 8),
            Err(MeshError::InvalidDimension { name: "radius", .. })
        ));
    }

    #[test]
    fn counts_and_closure_for_many_section_counts() {
        for sections in [3, 4, 5, 7, 16, 32, 64, 100] {
            let mesh = generate_cylinder(H, R, sections).unwrap();
            assert_eq!(mesh.vertex_count(), 2 + 4 * sections as usize);
            assert_eq!(mesh.index_count(), 12 * sections as usize);
            mesh.validate().unwrap();
            assert!(mesh.is_closed(), "open mesh for {sections} sections");
            assert!(mesh.is_consistently_oriented());
        }
    }

    #[test]
    fn centers_come_first() {
        let mesh = generate_cylinder(2.0, R, 6).unwrap();
        assert_eq!(mesh.positions()[0], Vec3::ZERO);
        assert_eq!(mesh.positions()[1], Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn four_sections_hit_the_cardinal_points() {
        let mesh = generate_cylinder(H, R, 4).unwrap();
        let expected = [
            Vec3::new(0.0, 0.0, R),
            Vec3::new(R, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -R),
            Vec3::new(-R, 0.0, 0.0),
        ];
        for (k, cardinal) in expected.iter().enumerate() {
            let base = 2 + 4 * k;
            let bottom = mesh.positions()[base];
            let top = mesh.positions()[base + 1];
            let rotated = rim_point(R, k as u32, 4);
            assert_eq!(bottom.x, rotated.x);
            assert_eq!(bottom.z, rotated.z);
            assert!(bottom.abs_diff_eq(*cardinal, 1e-6), "section {k}: {bottom}");
            assert!(top.abs_diff_eq(*cardinal + Vec3::new(0.0, H, 0.0), 1e-6));
        }
    }

    #[test]
    fn seam_closes_on_first_rim_point_exactly() {
        for sections in [3, 5, 32] {
            let mesh = generate_cylinder(H, R, sections).unwrap();
            let p = mesh.positions();
            let last = 2 + 4 * (sections as usize - 1);
            let (next_bottom, next_top) = (p[last + 2], p[last + 3]);
            let (first_bottom, first_top) = (p[2], p[3]);
            for (a, b) in [(next_bottom, first_bottom), (next_top, first_top)] {
                assert_eq!(a.x.to_bits(), b.x.to_bits());
                assert_eq!(a.y.to_bits(), b.y.to_bits());
                assert_eq!(a.z.to_bits(), b.z.to_bits());
            }
        }
    }

    #[test]
    fn adjacent_sections_share_rim_values() {
        let mesh = generate_cylinder(H, R, 9).unwrap();
        let p = mesh.positions();
        for k in 0..8 {
            let base = 2 + 4 * k;
            assert_eq!(p[base + 2], p[base + 4]);
            assert_eq!(p[base + 3], p[base + 5]);
        }
    }

    #[test]
    fn winding_faces_outward() {
        let sections = 32;
        let mesh = generate_cylinder(H, R, sections).unwrap();
        let step = TAU / sections as f32;
        let prism = 0.5 * sections as f32 * R * R * step.sin() * H;
        let volume = mesh.signed_volume();
        assert!(volume > 0.0);
        assert!((volume - prism).abs() < 1e-4, "volume {volume} vs {prism}");
    }

    #[test]
    fn every_triangle_touches_its_own_section() {
        let mesh = generate_cylinder(H, R, 3).unwrap();
        for (t, tri) in mesh.triangles().enumerate() {
            let section = (t / 4) as u32;
            let lo = 2 + 4 * section;
            assert!(tri.iter().all(|&i| i < 2 || (lo..lo + 4).contains(&i)));
        }
    }
}
