//! Per-pass uniform bindings
//!
//! Manages the uniform buffers and bind groups for the data shared by every
//! draw in a pass: the pass's view-projection, the light-space transform and
//! the directional light's shading terms. The depth pass and the lit pass
//! each get their own buffer so neither overwrites the other within a
//! submission. Bound to slot 0 in both pipelines.

use cgmath::{Matrix4, Point3};

use crate::{
    gfx::{
        camera::camera_utils::convert_matrix4_to_array,
        rendering::{context::PassMode, light::DirectionalLightParams},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content
///
/// MUST match the `PassUniforms` struct in `scene.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassUniforms {
    /// View-projection of whoever is looking: the light in the depth pass,
    /// the camera in the lit pass
    pub view_proj: [[f32; 4]; 4],
    /// Light projection x light view
    pub light_space: [[f32; 4]; 4],
    /// Eye position in homogenous coordinates
    pub eye_position: [f32; 4],
    pub light_direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub light_color: [f32; 4],
    /// x: depth bias, yzw unused
    pub shadow_params: [f32; 4],
}
// 64 + 64 + 7 * 16 = 240 bytes

fn extend(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

impl PassUniforms {
    pub fn new(
        view_proj: Matrix4<f32>,
        light_space: Matrix4<f32>,
        eye: Point3<f32>,
        light: &DirectionalLightParams,
        depth_bias: f32,
    ) -> Self {
        Self {
            view_proj: convert_matrix4_to_array(view_proj),
            light_space: convert_matrix4_to_array(light_space),
            eye_position: [eye.x, eye.y, eye.z, 1.0],
            light_direction: extend(light.direction, 0.0),
            ambient: extend(light.ambient, 1.0),
            diffuse: extend(light.diffuse, 1.0),
            specular: extend(light.specular, 1.0),
            light_color: extend(light.color, 1.0),
            shadow_params: [depth_bias, 0.0, 0.0, 0.0],
        }
    }

    pub fn view_proj_matrix(&self) -> Matrix4<f32> {
        self.view_proj.into()
    }

    pub fn light_space_matrix(&self) -> Matrix4<f32> {
        self.light_space.into()
    }

    pub fn depth_bias(&self) -> f32 {
        self.shadow_params[0]
    }
}

/// Type alias for the per-pass uniform buffer
pub type GlobalUBO = UniformBuffer<PassUniforms>;

/// Bind group layout plus one buffer and bind group per pass
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    depth_ubo: GlobalUBO,
    lit_ubo: GlobalUBO,
    depth_bind_group: wgpu::BindGroup,
    lit_bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Pass Globals Bind Group Layout");

        let depth_ubo = GlobalUBO::new(device);
        let lit_ubo = GlobalUBO::new(device);

        let depth_bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(depth_ubo.binding_resource())
            .create(device, "Depth Pass Globals");
        let lit_bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(lit_ubo.binding_resource())
            .create(device, "Lit Pass Globals");

        GlobalBindings {
            bind_group_layout,
            depth_ubo,
            lit_ubo,
            depth_bind_group,
            lit_bind_group,
        }
    }

    /// Uploads the uniforms for a pass; unchanged content is not re-sent.
    pub fn update(&mut self, queue: &wgpu::Queue, mode: PassMode, uniforms: &PassUniforms) {
        let ubo = match mode {
            PassMode::DepthOnly => &mut self.depth_ubo,
            PassMode::Lit => &mut self.lit_ubo,
        };
        ubo.update_content(queue, uniforms);
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self, mode: PassMode) -> &wgpu::BindGroup {
        match mode {
            PassMode::DepthOnly => &self.depth_bind_group,
            PassMode::Lit => &self.lit_bind_group,
        }
    }
}
