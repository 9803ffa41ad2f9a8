pub mod camera_controller;
pub mod camera_utils;
pub mod free_camera;

// Re-export main types
pub use camera_controller::FreeCameraController;
pub use camera_utils::CameraManager;
pub use free_camera::{FreeCamera, Movement, GROUND_CLAMP_Y};
