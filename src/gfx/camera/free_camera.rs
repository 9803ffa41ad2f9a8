//! First-person free-fly camera
//!
//! Orientation is stored as yaw/pitch in degrees and turned into a unit view
//! direction after every `look`. Movement translates along the view
//! direction, its right vector or world up, and is always followed by the
//! ground clamp.

use cgmath::*;

use super::camera_utils::OPENGL_TO_WGPU_MATRIX;
use crate::config::CameraConfig;

/// The camera may never sink below this height.
pub const GROUND_CLAMP_Y: f32 = 1.0;

/// Pitch is clamped to +/- this many degrees to avoid flipping over the pole.
pub const PITCH_LIMIT: f32 = 89.0;

/// Direction of a single translation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct FreeCamera {
    position: Point3<f32>,
    view_direction: Vector3<f32>,
    up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    fovy: Deg<f32>,
    aspect: f32,
    znear: f32,
    zfar: f32,
    move_speed: f32,
    angular_speed: f32,
    previous_cursor: Vector2<f32>,
    projection: Matrix4<f32>,
}

impl FreeCamera {
    /// Creates a camera at the origin looking down -Z.
    ///
    /// The projection is computed here once from `width / height` and never
    /// recomputed. The cursor anchor starts at the screen centre so the first
    /// `look` is relative to it.
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let fovy = Deg(config.fovy);
        let projection = OPENGL_TO_WGPU_MATRIX * perspective(fovy, aspect, config.near, config.far);

        Self {
            position: Point3::new(0.0, 0.0, 0.0),
            view_direction: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            yaw: -90.0,
            pitch: 0.0,
            fovy,
            aspect,
            znear: config.near,
            zfar: config.far,
            move_speed: config.move_speed,
            angular_speed: config.angular_speed,
            previous_cursor: Vector2::new(width as f32 / 2.0, height as f32 / 2.0),
            projection,
        }
    }

    /// Places the camera without validation; the ground clamp is not applied.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Point3::new(x, y, z);
    }

    pub fn move_forward(&mut self) {
        self.translate(Movement::Forward, self.move_speed);
    }

    pub fn move_backward(&mut self) {
        self.translate(Movement::Backward, self.move_speed);
    }

    pub fn move_left(&mut self) {
        self.translate(Movement::Left, self.move_speed);
    }

    pub fn move_right(&mut self) {
        self.translate(Movement::Right, self.move_speed);
    }

    pub fn move_up(&mut self) {
        self.translate(Movement::Up, self.move_speed);
    }

    pub fn move_down(&mut self) {
        self.translate(Movement::Down, self.move_speed);
    }

    /// Moves `distance` units in the given direction, then applies the ground clamp.
    pub fn translate(&mut self, movement: Movement, distance: f32) {
        let forward = self.view_direction.normalize();
        let right = self.view_direction.cross(self.up).normalize();
        let up = self.up.normalize();

        let step = match movement {
            Movement::Forward => forward,
            Movement::Backward => -forward,
            Movement::Right => right,
            Movement::Left => -right,
            Movement::Up => up,
            Movement::Down => -up,
        };

        self.position += step * distance;
        self.clamp_to_ground();
    }

    fn clamp_to_ground(&mut self) {
        if self.position.y < GROUND_CLAMP_Y {
            self.position.y = GROUND_CLAMP_Y;
        }
    }

    /// Turns the camera by the cursor's travel since the previous call.
    pub fn look(&mut self, cursor: Vector2<f32>) {
        let delta = (self.previous_cursor - cursor) * self.angular_speed;

        self.yaw -= delta.x;
        self.pitch = (self.pitch + delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.view_direction = direction_from_angles(self.yaw, self.pitch);

        self.previous_cursor = cursor;
    }

    /// Re-seeds the cursor anchor without turning the camera.
    ///
    /// Used when the cursor source changes (e.g. on lock/unlock) so the
    /// switch does not register as a jump.
    pub fn set_cursor_anchor(&mut self, cursor: Vector2<f32>) {
        self.previous_cursor = cursor;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.view_direction, self.up)
    }

    /// The perspective projection fixed at construction, in wgpu clip space
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn view_direction(&self) -> Vector3<f32> {
        self.view_direction
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    pub fn near(&self) -> f32 {
        self.znear
    }

    pub fn far(&self) -> f32 {
        self.zfar
    }
}

/// Unit view direction for yaw/pitch given in degrees
pub fn direction_from_angles(yaw: f32, pitch: f32) -> Vector3<f32> {
    let (yaw, pitch) = (Deg(yaw), Deg(pitch));
    Vector3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
    .normalize()
}
