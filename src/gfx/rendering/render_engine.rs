//! WGPU-based rendering engine
//!
//! [`RenderEngine`] owns the surface, device and every GPU resource the two
//! shadow-mapping passes need. Each frame is handed out as a [`Frame`], which
//! implements [`RenderContext`] by recording the pipeline's intents and
//! encodes them into real render passes on [`Frame::finish`].

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;
use wgpu::{Device, TextureFormat};

use super::context::{ClearBuffers, PassMode, RenderContext, Viewport, SHADOW_MAP_SLOT};
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::shadow::ShadowConfig;
use super::sky::{SkyBindings, SkyUniforms};
use crate::config::AppConfig;
use crate::error::{RenderError, Result};
use crate::gfx::{
    resources::{
        global_bindings::{GlobalBindings, PassUniforms},
        object_bindings::{JointPaletteUniform, ObjectBindings, ObjectUniforms},
        texture_resource::{ShadowMapBindings, TextureResource},
    },
    scene::{
        drawable::{Drawable, DrawableKind, InstanceSet, Mesh},
        vertex::InstanceRaw,
    },
};

const SHADOW_PIPELINE: &str = "Shadow";
const LIT_PIPELINE: &str = "Lit";
const SKY_PIPELINE: &str = "Sky";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,
    shadow_map: TextureResource,
    shadow_bindings: ShadowMapBindings,
    pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    object_bindings: ObjectBindings,
    sky_bindings: SkyBindings,
    /// Single identity transform fed to the instance slot of non-instanced draws
    identity_instance: wgpu::Buffer,
    shadow_config: ShadowConfig,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu, allocates the shadow map at the configured
    /// resolution and builds the "Shadow" (vertex-only), "Lit" and "Sky"
    /// pipelines.
    /// Any failure here is fatal to the application.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        app_config: &AppConfig,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Setup(format!("Failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Setup(format!("Failed to request adapter: {}", e)))?;

        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let shadow_config = app_config.shadow;
        let max_texture_dimension = 4096.max(shadow_config.resolution);
        let adapter_max = adapter.limits().max_texture_dimension_2d;
        if max_texture_dimension > adapter_max {
            return Err(RenderError::Setup(format!(
                "Shadow resolution {} exceeds the adapter's texture limit of {}",
                shadow_config.resolution, adapter_max
            )));
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: max_texture_dimension,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| RenderError::Setup(format!("Failed to request a device: {}", e)))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::Setup("Surface reports no supported formats".to_string()))?;

        let present_mode = if app_config.window.vsync {
            wgpu::PresentMode::Fifo
        } else if surface_capabilities
            .present_modes
            .contains(&wgpu::PresentMode::Immediate)
        {
            wgpu::PresentMode::Immediate
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {}x{} {:?}, {:?}",
            config.width,
            config.height,
            format,
            present_mode
        );

        let depth_texture =
            TextureResource::create_depth_texture(&device, config.width, config.height, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, shadow_config.resolution);
        let shadow_bindings = ShadowMapBindings::new(&device, &shadow_map);

        let global_bindings = GlobalBindings::new(&device);
        let object_bindings = ObjectBindings::new(&device);
        let sky_bindings = SkyBindings::new(&device);

        let identity = InstanceRaw::from(Matrix4::<f32>::identity());
        let identity_instance = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Identity Instance"),
            contents: bytemuck::bytes_of(&identity),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"))?;
        pipeline_manager.load_shader("sky", include_str!("sky.wgsl"))?;

        // Depth only; no culling so thin two-sided geometry still casts
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("scene")
                .with_vertex_entry("vs_depth")
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.layout().clone(),
                    object_bindings.layout().clone(),
                ])
                .with_vertex_only(),
        );

        pipeline_manager.register_pipeline(
            LIT_PIPELINE,
            PipelineConfig::default()
                .with_label("LIT")
                .with_shader("scene")
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.layout().clone(),
                    object_bindings.layout().clone(),
                    shadow_bindings.layout().clone(),
                ])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );

        // Fullscreen triangle at the far plane; geometry drawn later covers it
        pipeline_manager.register_pipeline(
            SKY_PIPELINE,
            PipelineConfig::default()
                .with_label("SKY")
                .with_shader("sky")
                .with_vertex_entry("vs_sky")
                .with_fragment_entry("fs_sky")
                .with_vertex_layouts(Vec::new())
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_depth_read_only()
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![sky_bindings.layout().clone()])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );

        pipeline_manager.create_all_pipelines()?;

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            depth_texture,
            shadow_map,
            shadow_bindings,
            pipeline_manager,
            global_bindings,
            object_bindings,
            sky_bindings,
            identity_instance,
            shadow_config,
        })
    }

    /// Acquires the next surface texture and starts recording a frame.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped
    /// (`Ok(None)`); a timed-out acquire is skipped too. Any other surface
    /// error is returned.
    pub fn begin_frame(&mut self) -> Result<Option<Frame<'_>>> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated; reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring surface texture; skipping frame");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Some(Frame {
            engine: self,
            surface_texture,
            view,
            passes: Vec::new(),
            objects: Vec::new(),
            palettes: vec![JointPaletteUniform::identity()],
        }))
    }

    /// Resizes the surface and recreates the window depth buffer.
    ///
    /// Zero-sized requests (minimized windows) are ignored. The shadow map
    /// keeps its resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
        log::debug!("Resized surface to {}x{}", width, height);
    }

    /// Recreates the shadow map when a pass asks for a different resolution.
    fn ensure_shadow_map_size(&mut self, size: u32) {
        if self.shadow_map.size() == (size, size) || size == 0 {
            return;
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if size > limit {
            log::warn!("Shadow map size {} exceeds device limit {}; keeping current map", size, limit);
            return;
        }

        self.shadow_map = TextureResource::create_shadow_map(&self.device, size);
        self.shadow_bindings.rebind(&self.device, &self.shadow_map);
        log::info!("Shadow map reallocated at {}x{}", size, size);
    }

    /// Returns current surface dimensions
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Window-sized viewport for the lit pass
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassTarget {
    ShadowMap,
    Window,
}

impl PassTarget {
    fn mode(self) -> PassMode {
        match self {
            PassTarget::ShadowMap => PassMode::DepthOnly,
            PassTarget::Window => PassMode::Lit,
        }
    }
}

struct RecordedDraw {
    name: String,
    meshes: Vec<Arc<Mesh>>,
    instances: Option<Arc<InstanceSet>>,
    object_index: usize,
    palette_index: usize,
}

struct RecordedPass {
    target: PassTarget,
    viewport: Option<Viewport>,
    clear: Option<ClearBuffers>,
    shadow_map_bound: bool,
    uniforms: Option<PassUniforms>,
    sky: Option<SkyUniforms>,
    draws: Vec<RecordedDraw>,
}

impl RecordedPass {
    fn new(target: PassTarget) -> Self {
        Self {
            target,
            viewport: None,
            clear: None,
            shadow_map_bound: false,
            uniforms: None,
            sky: None,
            draws: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.clear.is_none() && self.sky.is_none() && self.draws.is_empty()
    }
}

/// One frame being recorded against a [`RenderEngine`]
///
/// Targets, clears and draws are collected as issued and turned into render
/// passes by [`Frame::finish`]. Dropping a frame without finishing it
/// discards the surface texture unpresented.
pub struct Frame<'a> {
    engine: &'a mut RenderEngine,
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    passes: Vec<RecordedPass>,
    objects: Vec<ObjectUniforms>,
    palettes: Vec<JointPaletteUniform>,
}

impl Frame<'_> {
    fn current_pass(&mut self) -> &mut RecordedPass {
        if self.passes.is_empty() {
            self.passes.push(RecordedPass::new(PassTarget::Window));
        }
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    /// Encodes every recorded pass, then the optional overlay, and presents.
    ///
    /// `overlay` draws on top of the finished colour target, e.g. the debug UI.
    pub fn finish<F>(self, overlay: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let Frame {
            engine,
            surface_texture,
            view,
            passes,
            objects,
            palettes,
        } = self;

        engine
            .object_bindings
            .upload(&engine.device, &engine.queue, &objects, &palettes);
        for pass in &passes {
            if let Some(uniforms) = &pass.uniforms {
                engine
                    .global_bindings
                    .update(&engine.queue, pass.target.mode(), uniforms);
            }
            if let Some(sky) = &pass.sky {
                engine.sky_bindings.update(&engine.queue, sky);
            }
        }

        let engine: &RenderEngine = engine;
        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        for pass in passes.iter().filter(|pass| !pass.is_empty()) {
            match pass.target {
                PassTarget::ShadowMap => engine.encode_shadow_pass(&mut encoder, pass),
                PassTarget::Window => engine.encode_lit_pass(&mut encoder, &view, pass),
            }
        }

        if let Some(overlay) = overlay {
            overlay(&engine.device, &engine.queue, &mut encoder, &view);
        }

        engine.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }
}

impl RenderEngine {
    fn encode_shadow_pass(&self, encoder: &mut wgpu::CommandEncoder, pass: &RecordedPass) {
        let load = match pass.clear {
            Some(_) => wgpu::LoadOp::Clear(1.0),
            None => wgpu::LoadOp::Load,
        };

        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(pipeline) = self.pipeline_manager.get_pipeline(SHADOW_PIPELINE) else {
            log::warn!("Shadow pipeline not found; depth pass left empty");
            return;
        };
        shadow_pass.set_pipeline(pipeline);
        Self::apply_viewport(&mut shadow_pass, pass.viewport, self.shadow_map.size());
        shadow_pass.set_bind_group(0, self.global_bindings.bind_group(PassMode::DepthOnly), &[]);

        self.encode_draws(&mut shadow_pass, &pass.draws);
    }

    fn encode_lit_pass(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, pass: &RecordedPass) {
        let clear_color = self.shadow_config.clear_color;
        let color_load = match pass.clear {
            Some(ClearBuffers::ColorDepth) => wgpu::LoadOp::Clear(wgpu::Color {
                r: clear_color[0] as f64,
                g: clear_color[1] as f64,
                b: clear_color[2] as f64,
                a: clear_color[3] as f64,
            }),
            _ => wgpu::LoadOp::Load,
        };
        let depth_load = match pass.clear {
            Some(_) => wgpu::LoadOp::Clear(1.0),
            None => wgpu::LoadOp::Load,
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Main Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if pass.sky.is_some() {
            match self.pipeline_manager.get_pipeline(SKY_PIPELINE) {
                Some(pipeline) => {
                    render_pass.set_pipeline(pipeline);
                    Self::apply_viewport(&mut render_pass, pass.viewport, self.size());
                    render_pass.set_bind_group(0, self.sky_bindings.bind_group(), &[]);
                    render_pass.draw(0..3, 0..1);
                }
                None => log::warn!("Sky pipeline not found; background left at the clear colour"),
            }
        }

        if pass.draws.is_empty() {
            return;
        }
        let Some(pipeline) = self.pipeline_manager.get_pipeline(LIT_PIPELINE) else {
            log::warn!("Lit pipeline not found; colour pass left empty");
            return;
        };
        render_pass.set_pipeline(pipeline);
        Self::apply_viewport(&mut render_pass, pass.viewport, self.size());
        render_pass.set_bind_group(0, self.global_bindings.bind_group(PassMode::Lit), &[]);
        render_pass.set_bind_group(SHADOW_MAP_SLOT, self.shadow_bindings.bind_group(), &[]);

        self.encode_draws(&mut render_pass, &pass.draws);
    }

    fn apply_viewport(render_pass: &mut wgpu::RenderPass<'_>, viewport: Option<Viewport>, (width, height): (u32, u32)) {
        let viewport = viewport.unwrap_or(Viewport::new(width, height));
        render_pass.set_viewport(
            0.0,
            0.0,
            viewport.width.min(width) as f32,
            viewport.height.min(height) as f32,
            0.0,
            1.0,
        );
    }

    fn encode_draws(&self, render_pass: &mut wgpu::RenderPass<'_>, draws: &[RecordedDraw]) {
        for draw in draws {
            render_pass.set_bind_group(
                1,
                self.object_bindings.bind_group(),
                &[
                    self.object_bindings.object_offset(draw.object_index),
                    self.object_bindings.palette_offset(draw.palette_index),
                ],
            );

            let (instance_buffer, instance_count) = match &draw.instances {
                Some(instances) if instances.is_empty() => continue,
                Some(instances) => (instances.buffer(&self.device), instances.len() as u32),
                None => (&self.identity_instance, 1),
            };
            render_pass.set_vertex_buffer(1, instance_buffer.slice(..));

            for mesh in &draw.meshes {
                let buffers = mesh.buffers(&self.device);
                if buffers.index_count == 0 {
                    continue;
                }
                render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                render_pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..buffers.index_count, 0, 0..instance_count);
            }
            log::trace!("Encoded '{}' x{}", draw.name, instance_count);
        }
    }
}

impl RenderContext for Frame<'_> {
    fn bind_depth_target(&mut self) {
        self.passes.push(RecordedPass::new(PassTarget::ShadowMap));
    }

    fn unbind_depth_target(&mut self) {
        self.passes.push(RecordedPass::new(PassTarget::Window));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let pass = self.current_pass();
        pass.viewport = Some(viewport);
        if pass.target == PassTarget::ShadowMap && viewport.width == viewport.height {
            self.engine.ensure_shadow_map_size(viewport.width);
        }
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        self.current_pass().clear = Some(buffers);
    }

    fn bind_shadow_map(&mut self, slot: u32) {
        if slot != SHADOW_MAP_SLOT {
            log::warn!("Shadow map requested at slot {}, pipelines read it from slot {}", slot, SHADOW_MAP_SLOT);
        }
        self.current_pass().shadow_map_bound = true;
    }

    fn draw_sky(&mut self, sky: &SkyUniforms) {
        let pass = self.current_pass();
        if pass.target != PassTarget::Window {
            log::warn!("Skipping sky: the shadow map target is bound");
            return;
        }
        if pass.sky.replace(*sky).is_some() {
            log::warn!("Sky drawn twice in one pass; the last one wins");
        }
    }

    fn draw(&mut self, drawable: &Drawable, uniforms: &PassUniforms, mode: PassMode) {
        let pass = self.current_pass();
        if pass.target.mode() != mode {
            log::warn!(
                "Skipping '{}': {:?} draw issued while the {:?} target is bound",
                drawable.name,
                mode,
                pass.target
            );
            return;
        }
        if mode == PassMode::Lit && !pass.shadow_map_bound {
            log::warn!("Skipping '{}': lit draw with no shadow map bound", drawable.name);
            return;
        }

        match &pass.uniforms {
            None => pass.uniforms = Some(*uniforms),
            Some(existing) if existing != uniforms => {
                log::warn!(
                    "'{}' carries different pass uniforms; the pass keeps its first set",
                    drawable.name
                );
            }
            Some(_) => {}
        }

        let palette_index = match &drawable.kind {
            DrawableKind::SkinnedMesh { joints } => {
                self.palettes.push(JointPaletteUniform::from_matrices(joints));
                self.palettes.len() - 1
            }
            _ => 0,
        };
        let instances = match &drawable.kind {
            DrawableKind::InstancedMesh { instances } => Some(instances.clone()),
            _ => None,
        };
        let object_index = self.objects.len();
        self.objects.push(ObjectUniforms::for_drawable(drawable));

        let record = RecordedDraw {
            name: drawable.name.clone(),
            meshes: drawable.meshes.clone(),
            instances,
            object_index,
            palette_index,
        };
        self.current_pass().draws.push(record);
    }
}
