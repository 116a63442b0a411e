use glam::Vec3;

/// Integer cell coordinate in the instance grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: u32,
    pub z: u32,
}

impl GridCell {
    pub fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// World position of the cell in a `count_x × count_z` grid centered on
    /// the origin with unit spacing.
    pub fn world_position(self, count_x: u32, count_z: u32) -> Vec3 {
        Vec3::new(
            self.x as f32 - (count_x as f32 - 1.0) / 2.0,
            0.0,
            self.z as f32 - (count_z as f32 - 1.0) / 2.0,
        )
    }
}

/// Cells in instance order: X is the outer loop, Z the inner one.
pub(crate) fn cells(count_x: u32, count_z: u32) -> impl Iterator<Item = GridCell> {
    (0..count_x).flat_map(move |x| (0..count_z).map(move |z| GridCell::new(x, z)))
}

/// Base positions for every cell, in instance order.
pub fn grid_positions(count_x: u32, count_z: u32) -> Vec<Vec3> {
    cells(count_x, count_z)
        .map(|cell| cell.world_position(count_x, count_z))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two_order() {
        let p = grid_positions(2, 2);
        assert_eq!(
            p,
            vec![
                Vec3::new(-0.5, 0.0, -0.5),
                Vec3::new(-0.5, 0.0, 0.5),
                Vec3::new(0.5, 0.0, -0.5),
                Vec3::new(0.5, 0.0, 0.5),
            ]
        );
    }

    #[test]
    fn centered_for_even_and_odd_sizes() {
        for (cx, cz) in [(1, 1), (2, 3), (3, 2), (4, 4), (5, 7), (100, 100), (101, 99)] {
            let p = grid_positions(cx, cz);
            assert_eq!(p.len(), (cx * cz) as usize);
            let sum_x: f64 = p.iter().map(|v| v.x as f64).sum();
            let sum_z: f64 = p.iter().map(|v| v.z as f64).sum();
            assert_eq!(sum_x, 0.0, "x sum for {cx}x{cz}");
            assert_eq!(sum_z, 0.0, "z sum for {cx}x{cz}");
            assert!(p.iter().all(|v| v.y == 0.0));
        }
    }

    #[test]
    fn non_square_grid_uses_its_own_extents() {
        let p = grid_positions(3, 1);
        assert_eq!(p, vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO, Vec3::X]);
    }
}
