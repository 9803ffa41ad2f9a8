//! Debug overlay
//!
//! An imgui window drawn on top of the lit pass showing frame timing and the
//! camera position.

use std::time::Instant;

use cgmath::Point3;
use imgui::{Condition, Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

/// Values shown in the "Debug" window for one frame
#[derive(Debug, Clone, Copy)]
pub struct OverlayStats {
    pub camera_position: Point3<f32>,
    pub delta_secs: f32,
}

/// Text lines of the "Debug" window
pub fn debug_lines(framerate: f32, stats: &OverlayStats) -> [String; 3] {
    let ms_per_frame = if framerate > 0.0 { 1000.0 / framerate } else { 0.0 };
    let p = stats.camera_position;
    [
        format!("Application average {:.3} ms/frame ({:.1} FPS)", ms_per_frame, framerate),
        format!("Camera: {:.3} x, {:.3} y, {:.3} z", p.x, p.y, p.z),
        format!("Delta Time: {:.3}", stats.delta_secs),
    ]
}

pub struct DebugOverlay {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    frame_ready: bool,
}

impl DebugOverlay {
    pub fn new(device: &Device, queue: &Queue, output_color_format: TextureFormat, window: &Window) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Default);

        let font_size = (13.0 * window.scale_factor()) as f32;
        context.io_mut().font_global_scale = (1.0 / window.scale_factor()) as f32;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);
        log::debug!("Debug overlay created ({:?})", context.io().display_size);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
            frame_ready: false,
        }
    }

    /// Forwards a window event to imgui.
    ///
    /// Returns true when imgui wants the mouse or keyboard for itself.
    pub fn handle_window_event(&mut self, window: &Window, window_id: WindowId, event: &WindowEvent) -> bool {
        let wrapped: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform.handle_event(self.context.io_mut(), window, &wrapped);

        match event {
            WindowEvent::CursorMoved { .. } | WindowEvent::MouseInput { .. } | WindowEvent::MouseWheel { .. } => {
                self.context.io().want_capture_mouse
            }
            WindowEvent::KeyboardInput { .. } => self.context.io().want_capture_keyboard,
            _ => false,
        }
    }

    /// True while the pointer is over an overlay window
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// Builds this frame's UI. Must be followed by [`DebugOverlay::render`].
    pub fn prepare(&mut self, window: &Window, stats: &OverlayStats) {
        if self.frame_ready {
            // The previous frame was skipped before it reached `render`
            self.context.render();
            self.frame_ready = false;
        }

        let now = Instant::now();
        self.context.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::warn!("Skipping overlay frame: {}", e);
            self.frame_ready = false;
            return;
        }

        let ui = self.context.frame();
        let lines = debug_lines(ui.io().framerate, stats);
        ui.window("Debug")
            .position([10.0, 10.0], Condition::FirstUseEver)
            .always_auto_resize(true)
            .build(|| {
                for line in &lines {
                    ui.text(line);
                }
            });

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }
        self.frame_ready = true;
    }

    /// Draws the prepared UI over `color_attachment`, keeping its contents.
    pub fn render(&mut self, device: &Device, queue: &Queue, encoder: &mut CommandEncoder, color_attachment: &TextureView) {
        if !self.frame_ready {
            return;
        }
        self.frame_ready = false;

        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self.renderer.render(draw_data, queue, device, &mut render_pass) {
            log::warn!("Failed to render overlay: {}", e);
        }
    }
}
