//! GPU resource management
//!
//! Uniform buffers, bind groups and depth textures shared by the pipelines.

pub mod global_bindings;
pub mod object_bindings;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalBindings, GlobalUBO, PassUniforms};
pub use object_bindings::{JointPaletteUniform, ObjectBindings, ObjectUniforms};
pub use texture_resource::{ShadowMapBindings, TextureResource};
