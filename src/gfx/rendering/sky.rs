//! Procedural night sky
//!
//! A fullscreen triangle drawn first in the lit pass at the far plane. The
//! fragment stage turns each pixel back into a view ray and blends from the
//! horizon colour to the zenith colour by the ray's height.

use cgmath::{Matrix4, Point3, SquareMatrix};

use crate::{
    config::SkyConfig,
    gfx::camera::{camera_utils::convert_matrix4_to_array, free_camera::FreeCamera},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// MUST match `SkyUniforms` in `sky.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniforms {
    /// Inverse of projection x rotation-only view; maps clip space to view rays
    pub inv_view_proj: [[f32; 4]; 4],
    pub zenith_color: [f32; 4],
    pub horizon_color: [f32; 4],
}

impl SkyUniforms {
    pub fn new(camera: &FreeCamera, config: &SkyConfig) -> Self {
        let rotation = Matrix4::look_to_rh(Point3::new(0.0, 0.0, 0.0), camera.view_direction(), camera.up());
        let inv_view_proj = (camera.projection_matrix() * rotation)
            .invert()
            .unwrap_or_else(Matrix4::identity);

        let [zr, zg, zb] = config.zenith_color;
        let [hr, hg, hb] = config.horizon_color;
        Self {
            inv_view_proj: convert_matrix4_to_array(inv_view_proj),
            zenith_color: [zr, zg, zb, 1.0],
            horizon_color: [hr, hg, hb, 1.0],
        }
    }

    pub fn inv_view_proj_matrix(&self) -> Matrix4<f32> {
        self.inv_view_proj.into()
    }
}

/// Uniform buffer and bind group of the sky pipeline, bound at slot 0
pub struct SkyBindings {
    layout: BindGroupLayoutWithDesc,
    ubo: UniformBuffer<SkyUniforms>,
    bind_group: wgpu::BindGroup,
}

impl SkyBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Sky Bind Group Layout");
        let ubo = UniformBuffer::new(device);
        let bind_group = BindGroupBuilder::new(&layout)
            .resource(ubo.binding_resource())
            .create(device, "Sky Bind Group");

        Self { layout, ubo, bind_group }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, uniforms: &SkyUniforms) {
        self.ubo.update_content(queue, uniforms);
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
