//! Per-frame input snapshot
//!
//! Winit delivers keyboard and mouse input as events; the camera controller
//! wants a snapshot ("which keys are down, where is the cursor") once per
//! frame. `InputState` folds events into that snapshot.

use std::collections::HashSet;

use cgmath::Vector2;
use winit::{
    event::{DeviceEvent, ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};

/// Whether the OS cursor is visible or grabbed for mouse-look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    #[default]
    Free,
    Locked,
}

impl CursorMode {
    pub fn toggled(self) -> Self {
        match self {
            CursorMode::Free => CursorMode::Locked,
            CursorMode::Locked => CursorMode::Free,
        }
    }

    pub fn is_locked(self) -> bool {
        self == CursorMode::Locked
    }

    /// Grabs/hides or releases/shows the window's cursor.
    pub fn apply(self, window: &Window) {
        match self {
            CursorMode::Locked => {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grabbed {
                    log::warn!("Could not grab cursor: {}", e);
                }
                window.set_cursor_visible(false);
            }
            CursorMode::Free => {
                if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                    log::warn!("Could not release cursor: {}", e);
                }
                window.set_cursor_visible(true);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputState {
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    cursor: Vector2<f32>,
    pointer_captured: bool,
}

impl InputState {
    /// `initial_cursor` should match the camera's cursor anchor.
    pub fn new(initial_cursor: Vector2<f32>) -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            cursor: initial_cursor,
            pointer_captured: false,
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent, mode: CursorMode) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key_event(code, event.state, event.repeat);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32, mode);
            }
            WindowEvent::Focused(false) => {
                self.held.clear();
            }
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent, mode: CursorMode) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_motion(delta.0 as f32, delta.1 as f32, mode);
        }
    }

    /// Records a key transition. Auto-repeat never counts as a new press.
    pub fn key_event(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                if !repeat && self.held.insert(code) {
                    self.pressed.insert(code);
                }
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
    }

    /// Absolute cursor position; ignored while the cursor is locked.
    pub fn cursor_moved(&mut self, x: f32, y: f32, mode: CursorMode) {
        if !mode.is_locked() {
            self.cursor = Vector2::new(x, y);
        }
    }

    /// Raw motion advances the virtual cursor while the cursor is locked.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32, mode: CursorMode) {
        if mode.is_locked() {
            self.cursor += Vector2::new(dx, dy);
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// True only in the frame the key went down
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }

    pub fn cursor(&self) -> Vector2<f32> {
        self.cursor
    }

    /// Marks the pointer as owned by the UI so the camera does not turn.
    pub fn set_pointer_captured(&mut self, captured: bool) {
        self.pointer_captured = captured;
    }

    pub fn pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    /// Clears per-frame edges; call once after the frame consumed them.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }
}
