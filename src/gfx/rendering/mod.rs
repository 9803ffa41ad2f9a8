//! Core rendering functionality
//!
//! The shadow pipeline ([`shadow`]) issues each frame through the
//! [`RenderContext`] seam ([`context`]). [`RenderEngine`] is the wgpu
//! implementation; [`SoftwareContext`] rasterizes depth on the CPU.

pub mod context;
pub mod light;
pub mod pipeline_manager;
pub mod render_engine;
pub mod shadow;
pub mod sky;
pub mod software;

// Re-export main types
pub use context::{ClearBuffers, PassMode, RenderContext, Viewport, SHADOW_MAP_SLOT};
pub use light::{DirectionalLight, DirectionalLightParams, OrthoVolume};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::{Frame, RenderEngine};
pub use shadow::{
    project_to_shadow_map, shadow_factor, FrameStats, ShadowConfig, ShadowCoord, ShadowPipeline, SkyConfig,
};
pub use sky::{SkyBindings, SkyUniforms};
pub use software::{DepthTarget, RenderCommand, SoftwareContext};
