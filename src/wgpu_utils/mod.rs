// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Thin wrappers and builders for the bind groups and uniform buffers the
//! renderer creates over and over.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;
