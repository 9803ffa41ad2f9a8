//! # Graphics Module
//!
//! Camera, geometry, scene and rendering for the meadow demo.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - Free-fly first-person camera and its controller
//! - **Geometry** ([`geometry`]) - Procedural cube and grass blade meshes
//! - **Scene** ([`scene`]) - Drawables, instancing, skinning and the field layout
//! - **Rendering** ([`rendering`]) - The render-context seam, the two-pass shadow
//!   pipeline and the wgpu backend
//! - **Resources** ([`resources`]) - Uniform buffers, bind groups and textures
//! - **UI** ([`ui`]) - imgui debug overlay
//!
//! ## Usage
//!
//! The pass ordering lives in [`rendering::ShadowPipeline`] and only talks to a
//! [`rendering::RenderContext`]. [`RenderEngine`] hands out a GPU-backed
//! context per frame; [`rendering::SoftwareContext`] is a CPU one.
//!
//! ```no_run
//! use meadow::gfx::rendering::{DirectionalLight, ShadowPipeline, SoftwareContext};
//! use meadow::config::{LightConfig, ShadowConfig};
//!
//! let light = DirectionalLight::from_config(&LightConfig::default());
//! let _pipeline = ShadowPipeline::new(light, ShadowConfig::default()).unwrap();
//! let _ctx = SoftwareContext::new(256);
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod ui;

// Re-export commonly used types
pub use camera::free_camera::FreeCamera;
pub use rendering::render_engine::RenderEngine;
