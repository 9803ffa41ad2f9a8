//! CPU render context
//!
//! [`SoftwareContext`] implements [`RenderContext`] without a GPU. Depth-only
//! draws are rasterized into a [`DepthTarget`] with the same conventions as
//! the wgpu backend (depth in [0, 1], texture v pointing down, less-than
//! depth test, no culling). Lit and sky draws are only recorded. Every intent is
//! appended to a command log so call order can be inspected.

use cgmath::{Matrix4, Point3, Vector4};

use super::context::{ClearBuffers, PassMode, RenderContext, Viewport};
use super::shadow::shadow_factor;
use super::sky::SkyUniforms;
use crate::gfx::resources::global_bindings::PassUniforms;
use crate::gfx::scene::drawable::Drawable;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    BindDepthTarget,
    UnbindDepthTarget,
    SetViewport(Viewport),
    Clear(ClearBuffers),
    BindShadowMap(u32),
    DrawSky,
    Draw { drawable: String, mode: PassMode },
}

/// Square-pixel depth buffer, cleared to the far plane (1.0)
#[derive(Debug, Clone)]
pub struct DepthTarget {
    width: u32,
    height: u32,
    depth: Vec<f32>,
}

impl DepthTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: vec![1.0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.depth.fill(1.0);
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.depth[(y * self.width + x) as usize]
    }

    /// Nearest-texel lookup at texture coordinates, clamped to the edge.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let x = ((u * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((v * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as u32;
        self.get(x, y)
    }

    /// Rasterizes one clip-space triangle, keeping the nearest depth per texel.
    ///
    /// Triangles with a vertex behind the eye (w <= 0) are dropped whole.
    pub fn rasterize_triangle(&mut self, clip: [Vector4<f32>; 3]) {
        if clip.iter().any(|v| v.w <= 0.0) {
            return;
        }

        let (w, h) = (self.width as f32, self.height as f32);
        let screen = clip.map(|v| {
            let ndc = v.truncate() / v.w;
            [(ndc.x * 0.5 + 0.5) * w, (0.5 - ndc.y * 0.5) * h, ndc.z]
        });

        let edge = |a: [f32; 3], b: [f32; 3], px: f32, py: f32| {
            (b[0] - a[0]) * (py - a[1]) - (b[1] - a[1]) * (px - a[0])
        };

        let area = edge(screen[0], screen[1], screen[2][0], screen[2][1]);
        if area == 0.0 {
            return;
        }

        let min_x = screen.iter().map(|p| p[0]).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
        let min_y = screen.iter().map(|p| p[1]).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
        let max_x = screen.iter().map(|p| p[0]).fold(f32::MIN, f32::max).ceil().min(w - 1.0);
        let max_y = screen.iter().map(|p| p[1]).fold(f32::MIN, f32::max).ceil().min(h - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(screen[1], screen[2], px, py) / area;
                let w1 = edge(screen[2], screen[0], px, py) / area;
                let w2 = edge(screen[0], screen[1], px, py) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * screen[0][2] + w1 * screen[1][2] + w2 * screen[2][2];
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                let index = (y * self.width + x) as usize;
                if z < self.depth[index] {
                    self.depth[index] = z;
                }
            }
        }
    }
}

pub struct SoftwareContext {
    commands: Vec<RenderCommand>,
    depth_target: DepthTarget,
    depth_bound: bool,
    light_space: Option<Matrix4<f32>>,
    depth_bias: f32,
}

impl SoftwareContext {
    pub fn new(shadow_resolution: u32) -> Self {
        Self {
            commands: Vec::new(),
            depth_target: DepthTarget::new(shadow_resolution, shadow_resolution),
            depth_bound: false,
            light_space: None,
            depth_bias: 0.0,
        }
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn depth_target(&self) -> &DepthTarget {
        &self.depth_target
    }

    /// Shadow factor of a world position against the current shadow map,
    /// using the light-space transform and bias of the last lit draw.
    ///
    /// Returns 1.0 (lit) before any lit draw has been issued.
    pub fn shadow_factor_at(&self, world: Point3<f32>) -> f32 {
        match &self.light_space {
            Some(light_space) => shadow_factor(light_space, world, self.depth_bias, |u, v| {
                self.depth_target.sample(u, v)
            }),
            None => 1.0,
        }
    }

    fn rasterize(&mut self, drawable: &Drawable, view_proj: Matrix4<f32>) {
        for world in drawable.world_transforms() {
            let mvp = view_proj * world;
            for mesh in &drawable.meshes {
                for triangle in mesh.triangles() {
                    let clip = triangle.map(|vertex| mvp * drawable.skin_position(vertex).to_homogeneous());
                    self.depth_target.rasterize_triangle(clip);
                }
            }
        }
    }
}

impl RenderContext for SoftwareContext {
    fn bind_depth_target(&mut self) {
        self.depth_bound = true;
        self.commands.push(RenderCommand::BindDepthTarget);
    }

    fn unbind_depth_target(&mut self) {
        self.depth_bound = false;
        self.commands.push(RenderCommand::UnbindDepthTarget);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        if self.depth_bound
            && (viewport.width != self.depth_target.width()
                || viewport.height != self.depth_target.height())
        {
            self.depth_target = DepthTarget::new(viewport.width, viewport.height);
        }
        self.commands.push(RenderCommand::SetViewport(viewport));
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        if self.depth_bound && buffers == ClearBuffers::Depth {
            self.depth_target.clear();
        }
        self.commands.push(RenderCommand::Clear(buffers));
    }

    fn bind_shadow_map(&mut self, slot: u32) {
        self.commands.push(RenderCommand::BindShadowMap(slot));
    }

    fn draw_sky(&mut self, _sky: &SkyUniforms) {
        if self.depth_bound {
            log::warn!("Sky drawn while the depth target is bound");
        }
        self.commands.push(RenderCommand::DrawSky);
    }

    fn draw(&mut self, drawable: &Drawable, uniforms: &PassUniforms, mode: PassMode) {
        match mode {
            PassMode::DepthOnly if self.depth_bound => {
                self.rasterize(drawable, uniforms.view_proj_matrix());
            }
            PassMode::DepthOnly => {
                log::warn!("Depth-only draw of '{}' with no depth target bound", drawable.name);
            }
            PassMode::Lit => {
                self.light_space = Some(uniforms.light_space_matrix());
                self.depth_bias = uniforms.depth_bias();
            }
        }
        self.commands.push(RenderCommand::Draw {
            drawable: drawable.name.clone(),
            mode,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_triangle_covers_every_texel() {
        let mut target = DepthTarget::new(8, 8);
        target.rasterize_triangle([
            Vector4::new(-1.0, -1.0, 0.25, 1.0),
            Vector4::new(3.0, -1.0, 0.25, 1.0),
            Vector4::new(-1.0, 3.0, 0.25, 1.0),
        ]);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(target.get(x, y), 0.25);
            }
        }
    }

    #[test]
    fn nearer_depth_wins_regardless_of_order_or_winding() {
        let mut target = DepthTarget::new(4, 4);
        let quad = |z: f32| {
            [
                Vector4::new(-1.0, -1.0, z, 1.0),
                Vector4::new(-1.0, 3.0, z, 1.0),
                Vector4::new(3.0, -1.0, z, 1.0),
            ]
        };
        target.rasterize_triangle(quad(0.3));
        target.rasterize_triangle(quad(0.6));
        assert_eq!(target.get(1, 1), 0.3);

        target.clear();
        assert_eq!(target.get(1, 1), 1.0);
    }

    #[test]
    fn upper_half_lands_in_top_rows() {
        let mut target = DepthTarget::new(4, 4);
        // Covers ndc y in [0, 1] only
        target.rasterize_triangle([
            Vector4::new(-1.0, 0.0, 0.5, 1.0),
            Vector4::new(3.0, 0.0, 0.5, 1.0),
            Vector4::new(-1.0, 2.0, 0.5, 1.0),
        ]);
        assert_eq!(target.get(0, 0), 0.5);
        assert_eq!(target.get(0, 3), 1.0);
        assert_eq!(target.sample(0.1, 0.1), 0.5);
        assert_eq!(target.sample(0.1, 0.9), 1.0);
    }

    #[test]
    fn depth_outside_range_is_discarded() {
        let mut target = DepthTarget::new(2, 2);
        target.rasterize_triangle([
            Vector4::new(-1.0, -1.0, 1.5, 1.0),
            Vector4::new(3.0, -1.0, 1.5, 1.0),
            Vector4::new(-1.0, 3.0, 1.5, 1.0),
        ]);
        assert_eq!(target.get(0, 0), 1.0);
    }
}
