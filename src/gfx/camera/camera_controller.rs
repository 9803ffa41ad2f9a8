use winit::keyboard::KeyCode;

use super::free_camera::{FreeCamera, Movement};
use crate::config::CameraConfig;
use crate::input::InputState;

/// Key bindings for each movement direction
pub const MOVEMENT_KEYS: [(KeyCode, Movement); 6] = [
    (KeyCode::KeyW, Movement::Forward),
    (KeyCode::KeyS, Movement::Backward),
    (KeyCode::KeyA, Movement::Left),
    (KeyCode::KeyD, Movement::Right),
    (KeyCode::Space, Movement::Up),
    (KeyCode::ShiftLeft, Movement::Down),
];

/// Turns a per-frame input snapshot into camera commands.
pub struct FreeCameraController {
    /// Steps per second. `None` means exactly one step per frame.
    pub reference_rate: Option<f32>,
}

impl FreeCameraController {
    pub fn new(reference_rate: Option<f32>) -> Self {
        Self { reference_rate }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.reference_rate)
    }

    /// Distance one held key covers in a frame lasting `delta_secs`
    pub fn step_distance(&self, move_speed: f32, delta_secs: f32) -> f32 {
        match self.reference_rate {
            Some(rate) => move_speed * delta_secs * rate,
            None => move_speed,
        }
    }

    /// Moves for the highest-priority held key, then looks towards the cursor.
    ///
    /// At most one movement is applied per frame, in [`MOVEMENT_KEYS`] order.
    /// While the pointer belongs to the UI the cursor only re-anchors the
    /// camera, so releasing it does not turn the view by the travel in between.
    pub fn update(&self, camera: &mut FreeCamera, input: &InputState, delta_secs: f32) {
        if let Some(movement) = self.held_movement(input) {
            let distance = self.step_distance(camera.move_speed(), delta_secs);
            camera.translate(movement, distance);
        }

        if input.pointer_captured() {
            camera.set_cursor_anchor(input.cursor());
        } else {
            camera.look(input.cursor());
        }
    }

    /// The movement bound to the first held key in [`MOVEMENT_KEYS`]
    pub fn held_movement(&self, input: &InputState) -> Option<Movement> {
        MOVEMENT_KEYS
            .iter()
            .find(|(key, _)| input.is_held(*key))
            .map(|(_, movement)| *movement)
    }
}

impl Default for FreeCameraController {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector2;
    use winit::event::ElementState;

    use crate::input::CursorMode;

    fn input_with(keys: &[KeyCode]) -> InputState {
        let mut input = InputState::new(Vector2::new(800.0, 600.0));
        for key in keys {
            input.key_event(*key, ElementState::Pressed, false);
        }
        input
    }

    #[test]
    fn sixty_fps_frame_moves_one_step() {
        let controller = FreeCameraController::default();
        let distance = controller.step_distance(0.5, 1.0 / 60.0);
        assert!((distance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fixed_step_ignores_frame_time() {
        let controller = FreeCameraController::new(None);
        assert_eq!(controller.step_distance(0.5, 0.25), 0.5);
    }

    #[test]
    fn only_the_highest_priority_key_moves() {
        let controller = FreeCameraController::new(None);
        let mut camera = FreeCamera::new(&CameraConfig::default(), 1600, 1200);
        camera.set_position(0.0, 5.0, 0.0);

        controller.update(&mut camera, &input_with(&[KeyCode::KeyD, KeyCode::KeyW]), 0.016);

        let position = camera.position();
        assert!((position.z + 0.5).abs() < 1e-5);
        assert_eq!(position.x, 0.0);
        assert_eq!(camera.yaw(), -90.0);
    }

    #[test]
    fn key_priority_follows_binding_order() {
        let controller = FreeCameraController::new(None);
        let cases = [
            (vec![KeyCode::KeyS, KeyCode::KeyW], Movement::Forward),
            (vec![KeyCode::KeyA, KeyCode::KeyS], Movement::Backward),
            (vec![KeyCode::KeyD, KeyCode::KeyA], Movement::Left),
            (vec![KeyCode::Space, KeyCode::KeyD], Movement::Right),
            (vec![KeyCode::ShiftLeft, KeyCode::Space], Movement::Up),
            (vec![KeyCode::ShiftLeft], Movement::Down),
        ];
        for (keys, expected) in cases {
            assert_eq!(controller.held_movement(&input_with(&keys)), Some(expected));
        }
        assert_eq!(controller.held_movement(&input_with(&[])), None);
    }

    #[test]
    fn captured_pointer_does_not_turn_the_camera() {
        let controller = FreeCameraController::new(None);
        let mut camera = FreeCamera::new(&CameraConfig::default(), 1600, 1200);
        let mut input = input_with(&[]);

        input.set_pointer_captured(true);
        input.cursor_moved(200.0, 100.0, CursorMode::Free);
        controller.update(&mut camera, &input, 0.016);
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);

        // Leaving the UI must not replay the travel made over it
        input.set_pointer_captured(false);
        controller.update(&mut camera, &input, 0.016);
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);

        input.cursor_moved(210.0, 100.0, CursorMode::Free);
        controller.update(&mut camera, &input, 0.016);
        assert!((camera.yaw() - (-90.0 + 10.0 * 0.15)).abs() < 1e-4);
    }
}
