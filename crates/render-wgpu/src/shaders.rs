use cylgrid_render::ShaderSource;

/// Vertex stage: rebuilds the per-instance MVP from four row attributes.
pub const VERTEX_SHADER: &str = include_str!("../shaders/cylinder.vert.wgsl");

/// Fragment stage: flat per-instance color.
pub const FRAGMENT_SHADER: &str = include_str!("../shaders/cylinder.frag.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Shaders compiled into the binary, used when no shader directory is given.
pub fn builtin_shaders() -> ShaderSource {
    ShaderSource::new(VERTEX_SHADER, FRAGMENT_SHADER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_inputs_cover_all_locations() {
        for loc in 0..=5 {
            assert!(
                VERTEX_SHADER.contains(&format!("@location({loc})")),
                "missing location {loc}"
            );
        }
        assert!(VERTEX_SHADER.contains(VERTEX_ENTRY));
    }

    #[test]
    fn fragment_reads_the_interpolated_color() {
        assert!(FRAGMENT_SHADER.contains("@location(0) color: vec3<f32>"));
        assert!(FRAGMENT_SHADER.contains(FRAGMENT_ENTRY));
    }

    #[test]
    fn builtin_matches_constants() {
        let src = builtin_shaders();
        assert_eq!(src.vertex, VERTEX_SHADER);
        assert_eq!(src.fragment, FRAGMENT_SHADER);
    }
}
