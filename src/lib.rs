//! Meadow
//!
//! A small real-time renderer built on wgpu and winit: a free-fly camera over
//! an instanced grass field with trees, lit by a directional light with
//! two-pass shadow mapping.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod timer;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::MeadowApp;
pub use error::{RenderError, Result};
