//! # Primitive Shape Generation
//!
//! All shapes are Y-up and come with per-face normals.

use super::GeometryData;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes. Each face has
/// its own four vertices so normals stay flat.
#[rustfmt::skip]
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    let positions = [
        // Front face (+Z)
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face (-Z)
        [ 0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5],
        // Left face (-X)
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face (+X)
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face (+Y)
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face (-Y)
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    data.normals = face_normals
        .iter()
        .flat_map(|normal| std::iter::repeat(*normal).take(4))
        .collect();

    // Two triangles per face, counter-clockwise seen from outside
    for face in 0..6u32 {
        let base = face * 4;
        data.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a plane lying in XZ with its normal pointing up (+Y)
///
/// # Arguments
/// * `width` - Extent along X
/// * `depth` - Extent along Z
/// * `width_segments` - Number of subdivisions along X
/// * `depth_segments` - Number of subdivisions along Z
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        let pos_z = (0.5 - v) * depth;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, 0.0, pos_z]);
            data.normals.push([0.0, 1.0, 0.0]);
        }
    }

    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}

/// Generate a grass blade: two tapered quads crossed at right angles
///
/// The blade spans -0.5..0.5 on Y so that scaling it keeps it centred on
/// its placement height.
pub fn generate_grass_blade() -> GeometryData {
    const BASE_HALF_WIDTH: f32 = 0.06;
    const TIP_HALF_WIDTH: f32 = 0.01;

    let mut data = GeometryData::new();

    // Each quad faces along its own normal; the second is the first turned 90 degrees
    for (axis, normal) in [([1.0, 0.0], [0.0, 0.0, 1.0]), ([0.0, 1.0], [1.0, 0.0, 0.0])] {
        let base = data.vertices.len() as u32;
        let corner = |half_width: f32, y: f32| [axis[0] * half_width, y, axis[1] * half_width];

        data.vertices.push(corner(-BASE_HALF_WIDTH, -0.5));
        data.vertices.push(corner(BASE_HALF_WIDTH, -0.5));
        data.vertices.push(corner(TIP_HALF_WIDTH, 0.5));
        data.vertices.push(corner(-TIP_HALF_WIDTH, 0.5));
        data.normals.extend(std::iter::repeat(normal).take(4));

        data.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.normals.len(), 24);
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = generate_cube();
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [
                cube.vertices[tri[0] as usize],
                cube.vertices[tri[1] as usize],
                cube.vertices[tri[2] as usize],
            ];
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let cross = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let n = cube.normals[tri[0] as usize];
            let dot = cross[0] * n[0] + cross[1] * n[1] + cross[2] * n[2];
            assert!(dot > 0.0);
        }
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
        assert!(plane.vertices.iter().all(|v| v[1] == 0.0));
    }

    #[test]
    fn test_grass_blade_generation() {
        let blade = generate_grass_blade();
        assert_eq!(blade.vertex_count(), 8);
        assert_eq!(blade.triangle_count(), 4);
        let (min_y, max_y) = blade
            .vertices
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v[1]), hi.max(v[1])));
        assert_eq!((min_y, max_y), (-0.5, 0.5));
    }

    #[test]
    fn test_scene_format_conversion() {
        let mesh = generate_cube().into_mesh("cube").unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertices()[16].normal, [0.0, 1.0, 0.0]);
    }
}
