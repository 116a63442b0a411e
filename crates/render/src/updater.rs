use cylgrid_field::{InstanceField, vertical_offset};
use glam::{Mat4, Vec3};

use crate::context::RenderContext;
use crate::record::InstanceRecord;

/// Shared per-frame values computed before the instance loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub time: f32,
    pub camera_position: Vec3,
    pub view_projection: Mat4,
    /// Number of instances whose matrix was written.
    pub updated: usize,
}

/// Recompute every instance's bobbing offset and MVP matrix for time `t`,
/// writing the matrices into `records` (normally a mapped instance buffer).
///
/// `records` must hold one slot per instance. Only the first
/// `min(records.len(), field.len())` instances are written and the count is
/// reported in [`FrameTransforms::updated`]. Colors in `records` are left
/// untouched. The output depends only on `t`, the field's static data and
/// `context`.
pub fn update_transforms(
    context: &RenderContext,
    t: f32,
    field: &mut InstanceField,
    records: &mut [InstanceRecord],
) -> FrameTransforms {
    let _span = tracing::info_span!("transform_update", instances = field.len()).entered();
    if records.len() != field.len() {
        tracing::warn!(
            records = records.len(),
            instances = field.len(),
            "instance buffer size does not match the field"
        );
    }
    let updated = records.len().min(field.len());

    let (camera_position, view_projection) = context.view_projection(t);

    for ((instance, offset), record) in field.animation_slots().zip(records.iter_mut()) {
        *offset = vertical_offset(instance.position, t);
        let base = instance.position;
        let model = Mat4::from_translation(Vec3::new(base.x, base.y + *offset, base.z));
        record.set_mvp(&(view_projection * model));
    }

    FrameTransforms {
        time: t,
        camera_position,
        view_projection,
        updated,
    }
}
