//! # Procedural Geometry Generation
//!
//! Generates the handful of shapes the field scene is built from, so the
//! demo runs without any model files on disk.
//!
//! ## Supported Primitives
//!
//! - **Cube**: unit cube, used for the ground slab and procedural trees
//! - **Plane**: flat XZ plane with configurable subdivisions
//! - **Grass blade**: two crossed, tapered quads
//!
//! ## Usage
//!
//! ```rust
//! use meadow::gfx::geometry::{generate_cube, generate_plane};
//!
//! let cube_data = generate_cube();
//! assert_eq!(cube_data.triangle_count(), 12);
//!
//! let plane_data = generate_plane(10.0, 10.0, 4, 4);
//! assert_eq!(plane_data.vertex_count(), 25);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::error::Result;
use crate::gfx::scene::{drawable::Mesh, vertex::Vertex3D};

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts into the renderer's vertex format
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, position)| {
                Vertex3D::new(
                    *position,
                    self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                )
            })
            .collect();

        (vertices, self.indices.clone())
    }

    pub fn into_mesh(self, name: impl Into<String>) -> Result<Mesh> {
        let (vertices, indices) = self.to_scene_format();
        Mesh::new(name, vertices, indices)
    }
}
