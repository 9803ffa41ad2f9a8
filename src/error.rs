//! Error types for the renderer.
//!
//! Every failure in this crate is either a setup failure (window, adapter,
//! device, surface, pipeline) or a resource-load failure. Both are fatal and
//! surface synchronously where they happen; per-frame rendering has no
//! recoverable error path apart from a lost surface.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Window, adapter, device, surface or pipeline creation failed
    #[error("Setup error: {0}")]
    Setup(String),

    /// The swapchain surface could not hand out a frame
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// A model or shader could not be loaded from disk
    #[error("Could not load asset at '{}': {reason}", path.display())]
    AssetLoad { path: PathBuf, reason: String },

    /// Light shading parameters failed validation at bind time
    #[error("Invalid light parameters: {0}")]
    InvalidLightParams(String),

    /// Mesh or drawable data is malformed
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
}

/// Result type alias using the renderer's error type.
pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    pub fn asset_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_errors_name_the_missing_path() {
        let err = RenderError::asset_load("../assets/tree/oak_tree.obj", "file not found");
        let message = err.to_string();
        assert!(message.contains("../assets/tree/oak_tree.obj"));
        assert!(message.contains("file not found"));
    }
}
