//! Per-draw uniform bindings
//!
//! Every draw in a frame gets a slot in two dynamic-offset uniform buffers:
//! one holding its model and normal matrices and base colour, one holding its joint
//! palette. Static and instanced draws all point at palette slot 0, which is
//! kept at identity. Bound to slot 1 in both pipelines.

use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::{
    gfx::{camera::camera_utils::convert_matrix4_to_array, scene::drawable::{Drawable, MAX_JOINTS}},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

/// MUST match `ObjectUniforms` in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`, for transforming normals
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
}

impl ObjectUniforms {
    pub fn for_drawable(drawable: &Drawable) -> Self {
        let [r, g, b] = drawable.color();
        Self {
            model: convert_matrix4_to_array(drawable.transform),
            normal_matrix: convert_matrix4_to_array(normal_matrix(drawable.transform)),
            base_color: [r, g, b, 1.0],
        }
    }
}

/// Inverse-transpose of `model`. A singular model (zero scale) has no
/// meaningful normals and falls back to identity.
pub fn normal_matrix(model: Matrix4<f32>) -> Matrix4<f32> {
    model
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Matrix4::identity)
}

/// Fixed-size joint palette as laid out in `scene.wgsl`
#[repr(C)]
#[derive(Copy, Clone)]
pub struct JointPaletteUniform {
    pub joints: [[[f32; 4]; 4]; MAX_JOINTS],
}

// Plain f32 arrays with no padding
unsafe impl bytemuck::Pod for JointPaletteUniform {}
unsafe impl bytemuck::Zeroable for JointPaletteUniform {}

impl JointPaletteUniform {
    pub fn identity() -> Self {
        Self {
            joints: [convert_matrix4_to_array(Matrix4::identity()); MAX_JOINTS],
        }
    }

    /// Copies `matrices` in order; joints past the end stay identity.
    pub fn from_matrices(matrices: &[Matrix4<f32>]) -> Self {
        let mut palette = Self::identity();
        for (slot, matrix) in palette.joints.iter_mut().zip(matrices) {
            *slot = convert_matrix4_to_array(*matrix);
        }
        palette
    }
}

pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Lays `items` out back to back, each starting on a `stride` boundary
pub fn pack_strided<T: bytemuck::Pod>(items: &[T], stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let mut bytes = vec![0u8; items.len() * stride];
    for (chunk, item) in bytes.chunks_exact_mut(stride).zip(items) {
        let item_bytes = bytemuck::bytes_of(item);
        chunk[..item_bytes.len()].copy_from_slice(item_bytes);
    }
    bytes
}

pub struct ObjectBindings {
    layout: BindGroupLayoutWithDesc,
    object_stride: u64,
    palette_stride: u64,
    object_capacity: usize,
    palette_capacity: usize,
    object_buffer: wgpu::Buffer,
    palette_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ObjectBindings {
    const INITIAL_OBJECTS: usize = 64;
    const INITIAL_PALETTES: usize = 4;

    pub fn new(device: &wgpu::Device) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic())
            .next_binding_vertex(binding_types::uniform_dynamic())
            .create(device, "Object Bind Group Layout");

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let object_stride = align_to(std::mem::size_of::<ObjectUniforms>() as u64, alignment);
        let palette_stride = align_to(std::mem::size_of::<JointPaletteUniform>() as u64, alignment);

        let object_buffer = Self::create_buffer(device, "Object Uniforms", object_stride, Self::INITIAL_OBJECTS);
        let palette_buffer =
            Self::create_buffer(device, "Joint Palettes", palette_stride, Self::INITIAL_PALETTES);
        let bind_group = Self::create_bind_group(device, &layout, &object_buffer, &palette_buffer);

        Self {
            layout,
            object_stride,
            palette_stride,
            object_capacity: Self::INITIAL_OBJECTS,
            palette_capacity: Self::INITIAL_PALETTES,
            object_buffer,
            palette_buffer,
            bind_group,
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        object_buffer: &wgpu::Buffer,
        palette_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .resource(wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: object_buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniforms>() as u64),
            }))
            .resource(wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: palette_buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<JointPaletteUniform>() as u64),
            }))
            .create(device, "Object Bind Group")
    }

    /// Writes this frame's per-draw data, growing the buffers when needed.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        objects: &[ObjectUniforms],
        palettes: &[JointPaletteUniform],
    ) {
        let mut rebuild = false;
        if objects.len() > self.object_capacity {
            self.object_capacity = objects.len().next_power_of_two();
            self.object_buffer =
                Self::create_buffer(device, "Object Uniforms", self.object_stride, self.object_capacity);
            rebuild = true;
        }
        if palettes.len() > self.palette_capacity {
            self.palette_capacity = palettes.len().next_power_of_two();
            self.palette_buffer =
                Self::create_buffer(device, "Joint Palettes", self.palette_stride, self.palette_capacity);
            rebuild = true;
        }
        if rebuild {
            log::debug!(
                "Object bindings grown to {} objects / {} palettes",
                self.object_capacity,
                self.palette_capacity
            );
            self.bind_group =
                Self::create_bind_group(device, &self.layout, &self.object_buffer, &self.palette_buffer);
        }

        if !objects.is_empty() {
            queue.write_buffer(&self.object_buffer, 0, &pack_strided(objects, self.object_stride));
        }
        if !palettes.is_empty() {
            queue.write_buffer(&self.palette_buffer, 0, &pack_strided(palettes, self.palette_stride));
        }
    }

    pub fn object_offset(&self, index: usize) -> u32 {
        (index as u64 * self.object_stride) as u32
    }

    pub fn palette_offset(&self, index: usize) -> u32 {
        (index as u64 * self.palette_stride) as u32
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Vector4};

    #[test]
    fn sizes_match_the_shader() {
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 144);
        assert_eq!(std::mem::size_of::<JointPaletteUniform>(), 64 * MAX_JOINTS);
    }

    #[test]
    fn strides_respect_alignment() {
        assert_eq!(align_to(144, 256), 256);
        assert_eq!(align_to(6400, 256), 6400);
        assert_eq!(align_to(256, 256), 256);
    }

    #[test]
    fn packing_starts_each_item_on_a_stride() {
        let items = [[1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
        let bytes = pack_strided(&items, 32);
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[32..48], bytemuck::bytes_of(&items[1]));
        assert!(bytes[16..32].iter().all(|b| *b == 0));
    }

    #[test]
    fn palette_pads_with_identity() {
        let moved = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let palette = JointPaletteUniform::from_matrices(&[moved]);
        assert_eq!(palette.joints[0][3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(palette.joints[1], convert_matrix4_to_array(Matrix4::identity()));
        assert_eq!(palette.joints[MAX_JOINTS - 1][3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn normals_stay_perpendicular_under_nonuniform_scale() {
        let model = Matrix4::from_nonuniform_scale(4.0, 2.0, 4.0);
        // A 45 degree slope: its normal and one tangent
        let normal = Vector4::new(1.0, 1.0, 0.0, 0.0).normalize();
        let tangent = Vector4::new(1.0, -1.0, 0.0, 0.0);

        let world_tangent = (model * tangent).truncate();
        let world_normal = (normal_matrix(model) * normal).truncate();
        assert!(world_normal.dot(world_tangent).abs() < 1e-5);
        // The model matrix alone would tilt the normal off the surface
        assert!((model * normal).truncate().dot(world_tangent).abs() > 1.0);
    }

    #[test]
    fn rigid_transforms_keep_their_own_normal_matrix() {
        let model = Matrix4::from_translation(Vector3::new(3.0, 0.0, -2.0)) * Matrix4::from_angle_y(cgmath::Deg(30.0));
        let n = normal_matrix(model) * Vector4::new(0.0, 0.0, 1.0, 0.0);
        let m = model * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((n - m).magnitude() < 1e-5);
    }

    #[test]
    fn singular_model_falls_back_to_identity() {
        let flat = Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0);
        assert_eq!(normal_matrix(flat), Matrix4::identity());
    }
}
