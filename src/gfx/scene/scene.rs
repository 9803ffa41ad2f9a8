//! Flat drawable container and OBJ import
//!
//! The scene is an ordered list of [`Drawable`]s; order is draw order in both
//! passes. There is no hierarchy.

use std::path::Path;
use std::sync::Arc;

use super::drawable::{Drawable, Mesh};
use super::vertex::Vertex3D;
use crate::error::{RenderError, Result};

#[derive(Clone, Default)]
pub struct Scene {
    drawables: Vec<Drawable>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a drawable and returns its index
    pub fn add(&mut self, drawable: Drawable) -> usize {
        log::debug!("Added drawable '{}' to scene", drawable.name);
        self.drawables.push(drawable);
        self.drawables.len() - 1
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn drawables_mut(&mut self) -> &mut [Drawable] {
        &mut self.drawables
    }

    pub fn get(&self, index: usize) -> Option<&Drawable> {
        self.drawables.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Drawable> {
        self.drawables.get_mut(index)
    }

    /// First drawable with the given name
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Drawable> {
        self.drawables.iter_mut().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}

/// Loads every model in an OBJ file as one mesh each.
///
/// Faces are triangulated. Models without per-vertex normals get smoothed
/// face normals. Materials are ignored; colour is set on the drawable.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Vec<Arc<Mesh>>> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| RenderError::asset_load(path, e))?;

    if models.is_empty() {
        return Err(RenderError::asset_load(path, "file contains no models"));
    }

    let mut meshes = Vec::with_capacity(models.len());
    for (i, model) in models.iter().enumerate() {
        let mesh = &model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        let normals: Vec<[f32; 3]> = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect()
        } else {
            Mesh::calculate_face_normals(&positions, &mesh.indices)
        };

        let vertices = positions
            .iter()
            .zip(normals)
            .map(|(position, normal)| Vertex3D::new(*position, normal))
            .collect();

        let name = if model.name.is_empty() {
            format!("{}#{}", path.display(), i)
        } else {
            model.name.clone()
        };

        let loaded = Mesh::new(name, vertices, mesh.indices.clone())
            .map_err(|e| RenderError::asset_load(path, e))?;
        meshes.push(Arc::new(loaded));
    }

    log::info!(
        "Loaded {} mesh(es), {} triangles from '{}'",
        meshes.len(),
        meshes.iter().map(|m| m.triangle_count()).sum::<usize>(),
        path.display()
    );
    Ok(meshes)
}
