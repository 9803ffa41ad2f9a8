use cgmath::Matrix4;

use super::{camera_controller::FreeCameraController, free_camera::FreeCamera};
use crate::input::InputState;

/// Maps OpenGL clip space (z in -1..1) onto wgpu clip space (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Owns the camera together with the controller that drives it.
pub struct CameraManager {
    pub camera: FreeCamera,
    pub controller: FreeCameraController,
}

impl CameraManager {
    pub fn new(camera: FreeCamera, controller: FreeCameraController) -> Self {
        Self { camera, controller }
    }

    /// Applies one frame of input to the camera
    pub fn update(&mut self, input: &InputState, delta_secs: f32) {
        self.controller.update(&mut self.camera, input, delta_secs);
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}
