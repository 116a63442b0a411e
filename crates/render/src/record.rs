use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// One instance's slot in the per-instance attribute buffer.
///
/// `mvp_rows[r][c]` is row `r`, column `c` of the model-view-projection
/// matrix. The shader rebuilds the matrix from four vec4 attributes and
/// multiplies the position as a row vector, which undoes the transpose.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct InstanceRecord {
    pub mvp_rows: [[f32; 4]; 4],
    pub color: [f32; 3],
}

impl InstanceRecord {
    /// Number of f32 values in one record.
    pub const FLOATS: usize = 19;

    pub fn set_mvp(&mut self, mvp: &Mat4) {
        self.mvp_rows = mvp.transpose().to_cols_array_2d();
    }

    pub fn mvp(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.mvp_rows).transpose()
    }

    pub fn as_floats(&self) -> &[f32; Self::FLOATS] {
        bytemuck::cast_ref(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn record_is_nineteen_packed_floats() {
        assert_eq!(std::mem::size_of::<InstanceRecord>(), 19 * 4);
        assert_eq!(std::mem::align_of::<InstanceRecord>(), 4);
    }

    #[test]
    fn rows_are_emitted_in_order() {
        let m = Mat4::from_cols_array(&[
            1.0, 5.0, 9.0, 13.0, // column 0
            2.0, 6.0, 10.0, 14.0, // column 1
            3.0, 7.0, 11.0, 15.0, // column 2
            4.0, 8.0, 12.0, 16.0, // column 3
        ]);
        let mut record = InstanceRecord::default();
        record.set_mvp(&m);
        record.color = [0.1, 0.2, 0.3];
        let floats = record.as_floats();
        let expected: Vec<f32> = (1..=16).map(|v| v as f32).collect();
        assert_eq!(&floats[..16], expected.as_slice());
        assert_eq!(&floats[16..], &[0.1, 0.2, 0.3]);
        assert_eq!(record.mvp(), m);
    }

    #[test]
    fn row_vector_product_matches_matrix_product() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)) * Mat4::from_rotation_y(0.7);
        let mut record = InstanceRecord::default();
        record.set_mvp(&m);
        let p = Vec4::new(0.3, -1.0, 2.0, 1.0);
        // What the shader computes: dot(p, row_r) for each row.
        let rows = record.mvp_rows.map(Vec4::from_array);
        let shader = Vec4::new(p.dot(rows[0]), p.dot(rows[1]), p.dot(rows[2]), p.dot(rows[3]));
        assert!(shader.abs_diff_eq(m * p, 1e-5));
    }
}
