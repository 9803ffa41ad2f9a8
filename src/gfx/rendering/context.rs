//! Graphics-context seam
//!
//! [`RenderContext`] is the set of high-level intents the shadow pipeline
//! issues each frame. The wgpu backend turns them into render passes; the
//! software backend rasterizes depth on the CPU and records every call.

use super::sky::SkyUniforms;
use crate::gfx::resources::global_bindings::PassUniforms;
use crate::gfx::scene::drawable::Drawable;

/// Bind group slot the shadow map is bound to in the lit pass
pub const SHADOW_MAP_SLOT: u32 = 2;

/// Which pipeline a draw goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassMode {
    /// Vertex stage only, writing depth into the shadow map
    DepthOnly,
    /// Full shading, sampling the shadow map
    Lit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearBuffers {
    Depth,
    ColorDepth,
}

/// Render target area in pixels, anchored at the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }
}

pub trait RenderContext {
    /// Directs following clears and draws at the shadow depth target.
    fn bind_depth_target(&mut self);

    /// Returns to the default (window) target.
    fn unbind_depth_target(&mut self);

    fn set_viewport(&mut self, viewport: Viewport);

    fn clear(&mut self, buffers: ClearBuffers);

    /// Makes the shadow depth texture readable at bind group `slot`.
    fn bind_shadow_map(&mut self, slot: u32);

    /// Fills the background of the window target. Issued before any lit draw.
    fn draw_sky(&mut self, sky: &SkyUniforms);

    fn draw(&mut self, drawable: &Drawable, uniforms: &PassUniforms, mode: PassMode);
}
