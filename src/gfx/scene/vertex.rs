//! # Vertex Data Structures
//!
//! GPU-compatible vertex and per-instance formats shared by the depth and lit
//! pipelines. Static geometry uses the same layout as skinned geometry with
//! all of its weight on joint 0.

use cgmath::Matrix4;

/// Influences a single vertex can receive from the joint palette
pub const MAX_JOINT_INFLUENCES: usize = 4;

/// A 3D vertex with position, normal and skinning data.
///
/// # Memory Layout
///
/// `#[repr(C)]` keeps the layout in step with [`Vertex3D::desc`]:
///
/// - location 0: `position` (Float32x3)
/// - location 1: `normal` (Float32x3)
/// - location 2: `joints` (Uint32x4)
/// - location 3: `weights` (Float32x4)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// Indices into the drawable's joint palette
    pub joints: [u32; MAX_JOINT_INFLUENCES],
    /// Weight of each joint; sums to 1
    pub weights: [f32; MAX_JOINT_INFLUENCES],
}

impl Vertex3D {
    /// A vertex fully bound to joint 0, which is the identity for static meshes.
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self {
            position,
            normal,
            joints: [0; MAX_JOINT_INFLUENCES],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    pub fn skinned(
        position: [f32; 3],
        normal: [f32; 3],
        joints: [u32; MAX_JOINT_INFLUENCES],
        weights: [f32; MAX_JOINT_INFLUENCES],
    ) -> Self {
        Self {
            position,
            normal,
            joints,
            weights,
        }
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Uint32x4,
            3 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Per-instance model matrix, stepped once per instance
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl From<Matrix4<f32>> for InstanceRaw {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self {
            model: matrix.into(),
        }
    }
}

impl InstanceRaw {
    /// Layout occupying shader locations 4 to 7, one column per location.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}
