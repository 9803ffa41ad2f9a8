//! Drawable scene entries
//!
//! A [`Drawable`] pairs shared mesh data with a model transform, a base
//! colour and a [`DrawableKind`] describing how the mesh is replicated:
//! once, once per instance transform, or deformed by a joint palette.
//!
//! Mesh geometry and instance data are kept on the CPU and uploaded to the
//! GPU lazily the first time a wgpu frame draws them. Both live behind `Arc`,
//! so cloning a drawable shares its GPU buffers instead of duplicating them.

use std::sync::{Arc, OnceLock};

use cgmath::{Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3};
use wgpu::util::DeviceExt;

use super::vertex::{InstanceRaw, Vertex3D};
use crate::error::{RenderError, Result};

/// Size of the joint palette a skinned drawable can address
pub const MAX_JOINTS: usize = 100;

/// GPU copies of a mesh's vertex and index data
#[derive(Debug)]
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    gpu: OnceLock<MeshBuffers>,
}

impl Mesh {
    /// Builds a triangle-list mesh, rejecting dangling or partial triangles.
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Result<Self> {
        let name = name.into();

        if indices.len() % 3 != 0 {
            return Err(RenderError::InvalidMesh(format!(
                "mesh '{}' has {} indices, which is not a whole number of triangles",
                name,
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(RenderError::InvalidMesh(format!(
                "mesh '{}' references vertex {} but only has {}",
                name,
                bad,
                vertices.len()
            )));
        }

        Ok(Self {
            name,
            vertices,
            indices,
            gpu: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex3D; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }

    /// GPU buffers for this mesh, created on first use
    pub fn buffers(&self, device: &wgpu::Device) -> &MeshBuffers {
        self.gpu.get_or_init(|| {
            log::debug!(
                "Uploading mesh '{}' ({} vertices, {} triangles)",
                self.name,
                self.vertices.len(),
                self.triangle_count()
            );
            MeshBuffers {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertex Buffer", self.name)),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", self.name)),
                    contents: bytemuck::cast_slice(&self.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: self.indices.len() as u32,
            }
        })
    }

    // Helper function to calculate face normals if OBJ doesn't have them
    pub fn calculate_face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let v0 = Vector3::from(positions[i0]);
            let edge1 = Vector3::from(positions[i1]) - v0;
            let edge2 = Vector3::from(positions[i2]) - v0;
            let face_normal = edge1.cross(edge2);

            for index in [i0, i1, i2] {
                normals[index] += face_normal;
            }
        }

        normals
            .into_iter()
            .map(|n| {
                let length = n.magnitude();
                if length > 0.0 {
                    (n / length).into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
    }
}

/// A set of per-instance model matrices, uploaded once on first draw
#[derive(Debug)]
pub struct InstanceSet {
    transforms: Vec<Matrix4<f32>>,
    gpu: OnceLock<wgpu::Buffer>,
}

impl InstanceSet {
    pub fn new(transforms: Vec<Matrix4<f32>>) -> Self {
        Self {
            transforms,
            gpu: OnceLock::new(),
        }
    }

    pub fn transforms(&self) -> &[Matrix4<f32>] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn buffer(&self, device: &wgpu::Device) -> &wgpu::Buffer {
        self.gpu.get_or_init(|| {
            let raw: Vec<InstanceRaw> = self.transforms.iter().copied().map(Into::into).collect();
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Instance Buffer"),
                contents: bytemuck::cast_slice(&raw),
                usage: wgpu::BufferUsages::VERTEX,
            })
        })
    }
}

#[derive(Debug, Clone)]
pub enum DrawableKind {
    StaticMesh,
    InstancedMesh { instances: Arc<InstanceSet> },
    SkinnedMesh { joints: Vec<Matrix4<f32>> },
}

#[derive(Debug, Clone)]
pub struct Drawable {
    pub name: String,
    pub meshes: Vec<Arc<Mesh>>,
    pub transform: Matrix4<f32>,
    pub casts_shadows: bool,
    pub visible: bool,
    pub kind: DrawableKind,
    base_color: [f32; 3],
}

impl Drawable {
    /// A static, shadow-casting drawable with identity transform and white colour
    pub fn new(name: impl Into<String>, meshes: Vec<Arc<Mesh>>) -> Self {
        Self {
            name: name.into(),
            meshes,
            transform: Matrix4::identity(),
            casts_shadows: true,
            visible: true,
            kind: DrawableKind::StaticMesh,
            base_color: [1.0, 1.0, 1.0],
        }
    }

    /// Draws every mesh once per transform in `instances`
    pub fn instanced(
        name: impl Into<String>,
        meshes: Vec<Arc<Mesh>>,
        instances: Arc<InstanceSet>,
    ) -> Self {
        Self {
            kind: DrawableKind::InstancedMesh { instances },
            ..Self::new(name, meshes)
        }
    }

    /// A skinned drawable whose `joint_count` joints all start at identity
    pub fn skinned(name: impl Into<String>, meshes: Vec<Arc<Mesh>>, joint_count: usize) -> Result<Self> {
        let name = name.into();
        if joint_count > MAX_JOINTS {
            return Err(RenderError::InvalidMesh(format!(
                "'{}' needs {} joints, the palette holds {}",
                name, joint_count, MAX_JOINTS
            )));
        }
        Ok(Self {
            kind: DrawableKind::SkinnedMesh {
                joints: vec![Matrix4::identity(); joint_count],
            },
            ..Self::new(name, meshes)
        })
    }

    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Result<Self> {
        self.set_color(r, g, b)?;
        Ok(self)
    }

    /// Sets the base colour. Every channel must lie in [0, 1].
    pub fn set_color(&mut self, r: f32, g: f32, b: f32) -> Result<()> {
        let color = [r, g, b];
        if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(RenderError::InvalidMesh(format!(
                "colour of '{}' must lie in [0, 1], got {:?}",
                self.name, color
            )));
        }
        self.base_color = color;
        Ok(())
    }

    pub fn color(&self) -> [f32; 3] {
        self.base_color
    }

    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform = Matrix4::from_translation(translation);
    }

    /// Create a complete transform from translation, rotation, and scale
    pub fn set_transform_trs(
        &mut self,
        translation: Vector3<f32>,
        rotation_y: Deg<f32>,
        scale: Vector3<f32>,
    ) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_y(rotation_y);
        let s = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
        self.transform = t * r * s;
    }

    /// Replaces the joint palette of a skinned drawable.
    pub fn set_joint_matrices(&mut self, matrices: &[Matrix4<f32>]) -> Result<()> {
        if matrices.len() > MAX_JOINTS {
            return Err(RenderError::InvalidMesh(format!(
                "'{}' was given {} joint matrices, the palette holds {}",
                self.name,
                matrices.len(),
                MAX_JOINTS
            )));
        }
        match &mut self.kind {
            DrawableKind::SkinnedMesh { joints } => {
                joints.clear();
                joints.extend_from_slice(matrices);
                Ok(())
            }
            _ => Err(RenderError::InvalidMesh(format!(
                "'{}' is not a skinned drawable",
                self.name
            ))),
        }
    }

    /// Joint palette; empty unless skinned
    pub fn joint_matrices(&self) -> &[Matrix4<f32>] {
        match &self.kind {
            DrawableKind::SkinnedMesh { joints } => joints,
            _ => &[],
        }
    }

    /// Number of copies drawn per mesh
    pub fn instance_count(&self) -> usize {
        match &self.kind {
            DrawableKind::InstancedMesh { instances } => instances.len(),
            _ => 1,
        }
    }

    /// World transform of every drawn copy (model x instance)
    pub fn world_transforms(&self) -> Vec<Matrix4<f32>> {
        match &self.kind {
            DrawableKind::InstancedMesh { instances } => instances
                .transforms()
                .iter()
                .map(|instance| self.transform * *instance)
                .collect(),
            _ => vec![self.transform],
        }
    }

    /// Applies the joint palette to a vertex position in model space.
    ///
    /// Joints the palette does not cover act as identity, matching the
    /// identity padding of the GPU palette.
    pub fn skin_position(&self, vertex: &Vertex3D) -> Point3<f32> {
        let position = Point3::from(vertex.position);
        let palette = self.joint_matrices();
        if palette.is_empty() {
            return position;
        }

        let mut skinned = Vector3::new(0.0, 0.0, 0.0);
        for (joint, weight) in vertex.joints.iter().zip(vertex.weights.iter()) {
            if *weight == 0.0 {
                continue;
            }
            let matrix = palette
                .get(*joint as usize)
                .copied()
                .unwrap_or_else(Matrix4::identity);
            let moved = matrix.transform_point(position);
            skinned += Vector3::new(moved.x, moved.y, moved.z) * *weight;
        }
        Point3::new(skinned.x, skinned.y, skinned.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Arc<Mesh> {
        Arc::new(
            Mesh::new(
                "triangle",
                vec![
                    Vertex3D::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                    Vertex3D::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                    Vertex3D::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
                ],
                vec![0, 1, 2],
            )
            .unwrap(),
        )
    }

    #[test]
    fn mesh_rejects_bad_indices() {
        let vertices = vec![Vertex3D::new([0.0; 3], [0.0, 1.0, 0.0]); 3];
        assert!(Mesh::new("partial", vertices.clone(), vec![0, 1]).is_err());
        assert!(Mesh::new("dangling", vertices, vec![0, 1, 3]).is_err());
    }

    #[test]
    fn mesh_errors_and_debug_output_name_the_mesh() {
        let vertices = vec![Vertex3D::new([0.0; 3], [0.0, 1.0, 0.0]); 3];
        let err = Mesh::new("dangling", vertices, vec![0, 1, 7]).unwrap_err();
        assert!(err.to_string().contains("dangling"));

        let mesh = triangle();
        assert!(format!("{:?}", mesh).contains("triangle"));
        let instances = InstanceSet::new(vec![Matrix4::identity()]);
        assert!(format!("{:?}", instances).contains("transforms"));
    }

    #[test]
    fn colour_outside_unit_range_is_rejected() {
        let mut drawable = Drawable::new("box", vec![triangle()]);
        assert!(drawable.set_color(0.1, 0.9, 0.35).is_ok());
        assert_eq!(drawable.color(), [0.1, 0.9, 0.35]);

        let err = drawable.set_color(1.5, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, RenderError::InvalidMesh(_)));
        assert_eq!(drawable.color(), [0.1, 0.9, 0.35]);
    }

    #[test]
    fn clones_share_mesh_data() {
        let drawable = Drawable::new("box", vec![triangle()]);
        let copy = drawable.clone();
        assert!(Arc::ptr_eq(&drawable.meshes[0], &copy.meshes[0]));
    }

    #[test]
    fn instanced_transforms_compose_with_model() {
        let instances = Arc::new(InstanceSet::new(vec![
            Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)),
            Matrix4::from_translation(Vector3::new(0.0, 0.0, 2.0)),
        ]));
        let mut drawable = Drawable::instanced("grass", vec![triangle()], instances);
        drawable.set_translation(Vector3::new(0.0, 5.0, 0.0));

        let transforms = drawable.world_transforms();
        assert_eq!(drawable.instance_count(), 2);
        assert_eq!(transforms[0].w.truncate(), Vector3::new(1.0, 5.0, 0.0));
        assert_eq!(transforms[1].w.truncate(), Vector3::new(0.0, 5.0, 2.0));
    }

    #[test]
    fn skinning_blends_joint_matrices() {
        let mut drawable = Drawable::skinned("character", vec![triangle()], 2).unwrap();
        drawable
            .set_joint_matrices(&[
                Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)),
                Matrix4::from_translation(Vector3::new(0.0, 4.0, 0.0)),
            ])
            .unwrap();

        let vertex = Vertex3D::skinned([0.0; 3], [0.0, 1.0, 0.0], [0, 1, 0, 0], [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(drawable.skin_position(&vertex), Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn palette_size_is_bounded() {
        assert!(Drawable::skinned("too many", vec![triangle()], MAX_JOINTS + 1).is_err());
        let mut stat = Drawable::new("static", vec![triangle()]);
        assert!(stat.set_joint_matrices(&[Matrix4::identity()]).is_err());
    }

    #[test]
    fn face_normals_point_out_of_counter_clockwise_faces() {
        let normals = Mesh::calculate_face_normals(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[0, 1, 2],
        );
        for normal in normals {
            assert_eq!(normal, [0.0, 0.0, 1.0]);
        }
    }
}
