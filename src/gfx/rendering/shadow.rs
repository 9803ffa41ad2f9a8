//! Two-pass shadow mapping
//!
//! [`ShadowPipeline::render_frame`] drives a [`RenderContext`] through the
//! frame: depth from the light into the shadow map, then the lit pass from
//! the camera with the shadow map bound and the sky behind everything. The free functions here are the
//! shadow test the lit shader performs, written out on the CPU.

use cgmath::{Matrix4, Point3};

use super::context::{ClearBuffers, PassMode, RenderContext, Viewport, SHADOW_MAP_SLOT};
use super::light::DirectionalLight;
use super::sky::SkyUniforms;
use crate::error::Result;
use crate::gfx::camera::free_camera::FreeCamera;
use crate::gfx::resources::global_bindings::PassUniforms;
use crate::gfx::scene::drawable::Drawable;

pub use crate::config::{ShadowConfig, SkyConfig};

/// A world position expressed in shadow-map texture space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCoord {
    pub u: f32,
    pub v: f32,
    /// Light-space depth in [0, 1] for points inside the light volume
    pub depth: f32,
}

impl ShadowCoord {
    /// Whether the point falls inside the area and depth range the shadow map covers
    pub fn in_bounds(&self) -> bool {
        (0.0..=1.0).contains(&self.u) && (0.0..=1.0).contains(&self.v) && self.depth <= 1.0
    }
}

/// Transforms `world` by `light_space`, divides by w and remaps x/y to
/// texture coordinates. Texture v grows downwards, so clip-space y is flipped.
pub fn project_to_shadow_map(light_space: &Matrix4<f32>, world: Point3<f32>) -> ShadowCoord {
    let clip = *light_space * world.to_homogeneous();
    let ndc = clip.truncate() / clip.w;
    ShadowCoord {
        u: ndc.x * 0.5 + 0.5,
        v: -ndc.y * 0.5 + 0.5,
        depth: ndc.z,
    }
}

/// The shadow test: 1.0 when lit, 0.0 when occluded.
///
/// `lookup(u, v)` returns the depth stored in the shadow map. Fragments the
/// shadow map does not cover are treated as lit.
pub fn shadow_factor<F>(light_space: &Matrix4<f32>, world: Point3<f32>, bias: f32, lookup: F) -> f32
where
    F: Fn(f32, f32) -> f32,
{
    let coord = project_to_shadow_map(light_space, world);
    if !coord.in_bounds() {
        return 1.0;
    }

    let closest = lookup(coord.u, coord.v);
    if coord.depth - bias > closest {
        0.0
    } else {
        1.0
    }
}

/// Draw counts of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub shadow_casters: usize,
    pub lit_draws: usize,
}

pub struct ShadowPipeline {
    light: DirectionalLight,
    config: ShadowConfig,
    sky: SkyConfig,
}

impl ShadowPipeline {
    /// Fails if the light's shading parameters are out of range.
    pub fn new(light: DirectionalLight, config: ShadowConfig) -> Result<Self> {
        light.params().validate()?;
        Ok(Self {
            light,
            config,
            sky: SkyConfig::default(),
        })
    }

    pub fn with_sky(mut self, sky: SkyConfig) -> Self {
        self.sky = sky;
        self
    }

    pub fn light(&self) -> &DirectionalLight {
        &self.light
    }

    pub fn set_light(&mut self, light: DirectionalLight) -> Result<()> {
        light.params().validate()?;
        self.light = light;
        Ok(())
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    pub fn shadow_viewport(&self) -> Viewport {
        Viewport::square(self.config.resolution)
    }

    /// Uniforms for the depth pass: everything is seen from the light.
    pub fn depth_pass_uniforms(&self) -> PassUniforms {
        let light_space = self.light.light_space_matrix();
        PassUniforms::new(
            light_space,
            light_space,
            self.light.position(),
            self.light.params(),
            self.config.depth_bias,
        )
    }

    /// Uniforms for the lit pass: seen from the camera, shadowed from the light.
    pub fn lit_pass_uniforms(&self, camera: &FreeCamera) -> PassUniforms {
        PassUniforms::new(
            camera.view_projection(),
            self.light.light_space_matrix(),
            camera.position(),
            self.light.params(),
            self.config.depth_bias,
        )
    }

    /// Issues one full frame.
    ///
    /// Invisible drawables are skipped in both passes; drawables that do not
    /// cast shadows are skipped in the depth pass only. The sky is drawn
    /// ahead of the lit draws.
    pub fn render_frame<C>(
        &self,
        ctx: &mut C,
        camera: &FreeCamera,
        drawables: &[Drawable],
        viewport: Viewport,
    ) -> FrameStats
    where
        C: RenderContext + ?Sized,
    {
        let mut stats = FrameStats::default();

        ctx.bind_depth_target();
        ctx.set_viewport(self.shadow_viewport());
        ctx.clear(ClearBuffers::Depth);

        let depth_uniforms = self.depth_pass_uniforms();
        for drawable in drawables.iter().filter(|d| d.visible && d.casts_shadows) {
            ctx.draw(drawable, &depth_uniforms, PassMode::DepthOnly);
            stats.shadow_casters += 1;
        }

        ctx.unbind_depth_target();
        ctx.set_viewport(viewport);
        ctx.clear(ClearBuffers::ColorDepth);
        ctx.bind_shadow_map(SHADOW_MAP_SLOT);
        ctx.draw_sky(&SkyUniforms::new(camera, &self.sky));

        let lit_uniforms = self.lit_pass_uniforms(camera);
        for drawable in drawables.iter().filter(|d| d.visible) {
            ctx.draw(drawable, &lit_uniforms, PassMode::Lit);
            stats.lit_draws += 1;
        }

        log::debug!(
            "Frame: {} shadow casters, {} lit draws",
            stats.shadow_casters,
            stats.lit_draws
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightConfig;
    use crate::gfx::rendering::light::{DirectionalLightParams, OrthoVolume};
    use cgmath::{InnerSpace, Vector3};

    fn light() -> DirectionalLight {
        DirectionalLight::from_config(&LightConfig::default())
    }

    #[test]
    fn light_target_projects_to_map_centre() {
        let light = light();
        let target = light.position() + light.direction() * 50.0;
        let coord = project_to_shadow_map(&light.light_space_matrix(), target);

        assert!((coord.u - 0.5).abs() < 1e-4);
        assert!((coord.v - 0.5).abs() < 1e-4);
        let expected_depth = (50.0 - 0.1) / (1000.0 - 0.1);
        assert!((coord.depth - expected_depth).abs() < 1e-4);
    }

    #[test]
    fn texture_v_points_down() {
        let light = DirectionalLight::new(
            Point3::new(0.0, 0.0, 10.0),
            Vector3::new(0.0, 0.0, -1.0),
            OrthoVolume::default(),
        );
        let above = project_to_shadow_map(&light.light_space_matrix(), Point3::new(0.0, 50.0, 0.0));
        assert!(above.v < 0.5);
        assert!((above.v - 0.25).abs() < 1e-5);
    }

    #[test]
    fn outside_the_volume_is_lit() {
        let light = light();
        let far_away = light.position() + Vector3::new(0.0, 0.0, 1.0).cross(light.direction()).normalize() * 500.0;
        let factor = shadow_factor(&light.light_space_matrix(), far_away, 0.005, |_, _| 0.0);
        assert_eq!(factor, 1.0);
    }

    #[test]
    fn bias_decides_self_shadowing() {
        let light = light();
        let point = light.position() + light.direction() * 100.0;
        let depth = project_to_shadow_map(&light.light_space_matrix(), point).depth;

        // Stored depth equal to the fragment's own depth is lit
        assert_eq!(shadow_factor(&light.light_space_matrix(), point, 0.005, |_, _| depth), 1.0);
        // Something clearly closer to the light occludes it
        assert_eq!(
            shadow_factor(&light.light_space_matrix(), point, 0.005, |_, _| depth - 0.05),
            0.0
        );
    }

    #[test]
    fn invalid_params_are_rejected_when_bound() {
        let bad = light().with_params(DirectionalLightParams {
            color: [2.0, 1.0, 1.0],
            ..Default::default()
        });
        assert!(ShadowPipeline::new(bad, ShadowConfig::default()).is_err());

        let mut pipeline = ShadowPipeline::new(light(), ShadowConfig::default()).unwrap();
        assert!(pipeline.set_light(bad).is_err());
        assert_eq!(pipeline.light(), &light());
    }
}
