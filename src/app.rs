use std::sync::Arc;

use cgmath::Vector2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::AppConfig,
    error::{RenderError, Result},
    gfx::{
        camera::{CameraManager, FreeCamera, FreeCameraController},
        rendering::{DirectionalLight, RenderEngine, ShadowPipeline},
        scene::Field,
        ui::{DebugOverlay, OverlayStats},
    },
    input::{CursorMode, InputState},
    timer::FrameTimer,
};

/// The field demo: a window, a free-fly camera and the shadow-mapped field.
///
/// Escape quits, T toggles cursor lock, W/A/S/D/Space/Left-Shift move and the
/// mouse looks around.
pub struct MeadowApp {
    config: AppConfig,
    state: Option<AppState>,
    /// Fatal error raised inside the event loop, returned from [`MeadowApp::run`]
    error: Option<RenderError>,
}

struct AppState {
    window: Arc<Window>,
    render_engine: RenderEngine,
    overlay: DebugOverlay,
    camera_manager: CameraManager,
    shadow_pipeline: ShadowPipeline,
    field: Field,
    input: InputState,
    cursor_mode: CursorMode,
    timer: FrameTimer,
}

impl MeadowApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            error: None,
        }
    }

    /// Runs the event loop until the window closes or a fatal error occurs.
    pub fn run(mut self) -> Result<()> {
        let event_loop =
            EventLoop::new().map_err(|e| RenderError::Setup(format!("Failed to create event loop: {}", e)))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self)
            .map_err(|e| RenderError::Setup(format!("Event loop failed: {}", e)))?;

        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RenderError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_state(&self, event_loop: &ActiveEventLoop) -> Result<AppState> {
        let window_config = &self.config.window;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(PhysicalSize::new(window_config.width, window_config.height)),
            )
            .map_err(|e| RenderError::Setup(format!("Failed to create window: {}", e)))?;
        let window = Arc::new(window);

        let PhysicalSize { width, height } = window.inner_size();
        let render_engine =
            pollster::block_on(RenderEngine::new(window.clone(), width, height, &self.config))?;

        let light = DirectionalLight::from_config(&self.config.light);
        let shadow_pipeline = ShadowPipeline::new(light, self.config.shadow)?.with_sky(self.config.sky);
        let field = Field::build(&self.config.scene)?;

        let camera = FreeCamera::new(&self.config.camera, width, height);
        let controller = FreeCameraController::from_config(&self.config.camera);
        let input = InputState::new(Vector2::new(width as f32 / 2.0, height as f32 / 2.0));

        let cursor_mode = CursorMode::default();
        cursor_mode.apply(&window);

        let overlay = DebugOverlay::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );

        log::info!("Ready: {}x{}, shadow map {}", width, height, self.config.shadow.resolution);

        Ok(AppState {
            window,
            render_engine,
            overlay,
            camera_manager: CameraManager::new(camera, controller),
            shadow_pipeline,
            field,
            input,
            cursor_mode,
            timer: FrameTimer::new(),
        })
    }
}

impl AppState {
    /// Runs one frame: input, camera, scene update, both passes, overlay.
    ///
    /// Returns false when the app should exit.
    fn redraw(&mut self) -> Result<bool> {
        let delta_secs = self.timer.tick().as_secs_f32();

        if self.input.was_pressed(KeyCode::Escape) {
            return Ok(false);
        }
        if self.input.was_pressed(KeyCode::KeyT) {
            self.cursor_mode = self.cursor_mode.toggled();
            self.cursor_mode.apply(&self.window);
            self.camera_manager.camera.set_cursor_anchor(self.input.cursor());
            log::debug!("Cursor mode: {:?}", self.cursor_mode);
        }

        let pointer_captured = !self.cursor_mode.is_locked() && self.overlay.wants_mouse();
        self.input.set_pointer_captured(pointer_captured);
        self.camera_manager.update(&self.input, delta_secs);
        let camera = &self.camera_manager.camera;
        self.field.follow_camera(camera.position());
        self.field.animate(self.timer.elapsed_secs())?;

        self.overlay.prepare(
            &self.window,
            &OverlayStats {
                camera_position: camera.position(),
                delta_secs,
            },
        );

        let viewport = self.render_engine.viewport();
        if let Some(mut frame) = self.render_engine.begin_frame()? {
            self.shadow_pipeline
                .render_frame(&mut frame, camera, self.field.drawables(), viewport);

            let overlay = &mut self.overlay;
            frame.finish(Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| overlay.render(device, queue, encoder, view),
            ));
        }

        self.input.end_frame();
        Ok(true)
    }
}

impl ApplicationHandler for MeadowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.create_state(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let captured = state.overlay.handle_window_event(&state.window, window_id, &event);
        // The cursor position is always tracked; capture only gates the look step
        if !captured || matches!(event, WindowEvent::CursorMoved { .. }) {
            state.input.handle_window_event(&event, state.cursor_mode);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                // The camera's projection stays as constructed
                state.render_engine.resize(width, height);
            }
            WindowEvent::RedrawRequested => match state.redraw() {
                Ok(true) => {}
                Ok(false) => event_loop.exit(),
                Err(e) => self.fail(event_loop, e),
            },
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(state) = self.state.as_mut() {
            state.input.handle_device_event(&event, state.cursor_mode);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}
