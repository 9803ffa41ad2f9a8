//! Free camera scenarios driven through the controller and input state

use cgmath::{InnerSpace, Point3, Vector2, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

use meadow::config::CameraConfig;
use meadow::gfx::camera::free_camera::direction_from_angles;
use meadow::gfx::camera::{CameraManager, FreeCamera, FreeCameraController, GROUND_CLAMP_Y};
use meadow::input::{CursorMode, InputState};

const WIDTH: u32 = 1600;
const HEIGHT: u32 = 1200;

fn centre() -> Vector2<f32> {
    Vector2::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0)
}

fn manager() -> CameraManager {
    let config = CameraConfig::default();
    CameraManager::new(
        FreeCamera::new(&config, WIDTH, HEIGHT),
        // One step per frame regardless of frame time
        FreeCameraController::new(None),
    )
}

fn press(input: &mut InputState, key: KeyCode) {
    input.key_event(key, ElementState::Pressed, false);
}

fn release(input: &mut InputState, key: KeyCode) {
    input.key_event(key, ElementState::Released, false);
}

#[test]
fn one_forward_step_from_origin_lands_on_the_ground_clamp() {
    let mut manager = manager();
    let mut input = InputState::new(centre());

    press(&mut input, KeyCode::KeyW);
    manager.update(&input, 1.0 / 60.0);

    let position = manager.camera.position();
    assert_eq!(position.x, 0.0);
    assert_eq!(position.y, 1.0);
    assert!((position.z + 0.5).abs() < 1e-6);
}

#[test]
fn view_direction_follows_yaw_and_pitch() {
    let mut manager = manager();
    let mut input = InputState::new(centre());

    input.cursor_moved(centre().x + 40.0, centre().y - 100.0, CursorMode::Free);
    manager.update(&input, 1.0 / 60.0);

    let camera = &manager.camera;
    let (yaw, pitch) = (camera.yaw(), camera.pitch());
    assert!((yaw - (-90.0 + 40.0 * 0.15)).abs() < 1e-4);
    assert!((pitch - 15.0).abs() < 1e-4);

    let expected = direction_from_angles(yaw, pitch);
    assert!((camera.view_direction() - expected).magnitude() < 1e-6);

    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    let by_hand = [yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()];
    let actual = camera.view_direction();
    for (a, b) in [actual.x, actual.y, actual.z].into_iter().zip(by_hand) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn extreme_cursor_travel_clamps_pitch() {
    let mut manager = manager();
    let mut input = InputState::new(centre());

    input.cursor_moved(centre().x, -10_000.0, CursorMode::Free);
    manager.update(&input, 1.0 / 60.0);
    assert_eq!(manager.camera.pitch(), 89.0);

    input.cursor_moved(centre().x, 20_000.0, CursorMode::Free);
    manager.update(&input, 1.0 / 60.0);
    assert_eq!(manager.camera.pitch(), -89.0);
}

#[test]
fn view_direction_matches_yaw_and_pitch_under_random_looks() {
    let mut manager = manager();
    let mut input = InputState::new(centre());
    let mut rng = StdRng::seed_from_u64(0x6d65_6164);

    for _ in 0..500 {
        let x = rng.random::<f32>() * 4000.0 - 1000.0;
        let y = rng.random::<f32>() * 4000.0 - 1000.0;
        input.cursor_moved(x, y, CursorMode::Free);
        manager.update(&input, 1.0 / 60.0);

        let camera = &manager.camera;
        assert!((camera.view_direction().magnitude() - 1.0).abs() < 1e-5);
        assert!(camera.pitch().abs() <= 89.0);

        let (yaw, pitch) = (camera.yaw().to_radians(), camera.pitch().to_radians());
        let expected = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        assert!((camera.view_direction() - expected).magnitude() < 1e-4);
    }
}

#[test]
fn camera_never_goes_below_the_ground() {
    let mut manager = manager();
    let mut input = InputState::new(centre());
    let mut rng = StdRng::seed_from_u64(42);
    let keys = [
        KeyCode::KeyW,
        KeyCode::KeyA,
        KeyCode::KeyS,
        KeyCode::KeyD,
        KeyCode::Space,
        KeyCode::ShiftLeft,
    ];

    manager.camera.set_position(0.0, 5.0, 0.0);
    // Look steeply down so forward motion pushes into the ground
    input.cursor_moved(centre().x, centre().y + 1000.0, CursorMode::Free);

    for _ in 0..300 {
        for key in keys {
            if rng.random::<f32>() < 0.5 {
                press(&mut input, key);
            } else {
                release(&mut input, key);
            }
        }
        manager.update(&input, 1.0 / 60.0);
        input.end_frame();
        assert!(manager.camera.position().y >= GROUND_CLAMP_Y);
    }
}

#[test]
fn projection_is_fixed_at_construction() {
    let mut manager = manager();
    let mut input = InputState::new(centre());
    let before = manager.camera.projection_matrix();

    press(&mut input, KeyCode::KeyD);
    input.cursor_moved(100.0, 900.0, CursorMode::Free);
    for _ in 0..10 {
        manager.update(&input, 1.0 / 60.0);
    }

    let after = manager.camera.projection_matrix();
    let bits = |m: cgmath::Matrix4<f32>| {
        let columns: [[f32; 4]; 4] = m.into();
        columns.map(|c| c.map(f32::to_bits))
    };
    assert_eq!(bits(before), bits(after));
}

#[test]
fn still_cursor_leaves_orientation_alone() {
    let mut manager = manager();
    let mut input = InputState::new(centre());

    input.cursor_moved(900.0, 500.0, CursorMode::Free);
    manager.update(&input, 1.0 / 60.0);
    let (yaw, pitch, direction) = (
        manager.camera.yaw(),
        manager.camera.pitch(),
        manager.camera.view_direction(),
    );

    for _ in 0..5 {
        manager.update(&input, 1.0 / 60.0);
    }
    assert_eq!(manager.camera.yaw(), yaw);
    assert_eq!(manager.camera.pitch(), pitch);
    assert_eq!(manager.camera.view_direction(), direction);
}

#[test]
fn locked_cursor_turns_the_camera_from_raw_motion() {
    let mut manager = manager();
    let mut input = InputState::new(centre());

    input.mouse_motion(-20.0, 0.0, CursorMode::Locked);
    // Absolute cursor events are ignored while locked
    input.cursor_moved(0.0, 0.0, CursorMode::Locked);
    manager.update(&input, 1.0 / 60.0);

    assert!((manager.camera.yaw() - (-93.0)).abs() < 1e-4);
    assert_eq!(manager.camera.position(), Point3::new(0.0, 0.0, 0.0));
}
