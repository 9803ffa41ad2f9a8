//! Shadow pipeline scenarios run against the CPU render context

use std::sync::Arc;

use cgmath::{Matrix4, Point3, Vector3};

use meadow::config::{CameraConfig, ShadowConfig};
use meadow::gfx::camera::FreeCamera;
use meadow::gfx::geometry::{generate_cube, generate_plane};
use meadow::gfx::rendering::{
    ClearBuffers, DirectionalLight, FrameStats, OrthoVolume, PassMode, RenderCommand, ShadowPipeline,
    SoftwareContext, Viewport, SHADOW_MAP_SLOT,
};
use meadow::gfx::scene::{load_obj, Drawable, InstanceSet, Mesh};
use meadow::RenderError;

const SHADOW_RESOLUTION: u32 = 256;

fn overhead_pipeline() -> ShadowPipeline {
    let light = DirectionalLight::new(
        Point3::new(0.0, 50.0, 0.0),
        Vector3::new(0.0, -1.0, 0.0),
        OrthoVolume {
            left: -20.0,
            right: 20.0,
            bottom: -20.0,
            top: 20.0,
            near: 0.1,
            far: 100.0,
        },
    );
    let config = ShadowConfig {
        resolution: SHADOW_RESOLUTION,
        ..Default::default()
    };
    ShadowPipeline::new(light, config).unwrap()
}

fn camera() -> FreeCamera {
    FreeCamera::new(&CameraConfig::default(), 800, 600)
}

fn cube() -> Arc<Mesh> {
    Arc::new(generate_cube().into_mesh("cube").unwrap())
}

fn ground() -> Drawable {
    let plane = Arc::new(generate_plane(200.0, 200.0, 1, 1).into_mesh("plane").unwrap());
    let mut ground = Drawable::new("ground", vec![plane]);
    ground.casts_shadows = false;
    ground
}

/// A 4 x 2 x 4 box standing on the ground at `x`, `z`
fn box_at(name: &str, x: f32, z: f32) -> Drawable {
    let mut drawable = Drawable::new(name, vec![cube()]);
    drawable.set_transform_trs(Vector3::new(x, 1.0, z), cgmath::Deg(0.0), Vector3::new(4.0, 2.0, 4.0));
    drawable
}

fn render(drawables: &[Drawable]) -> (SoftwareContext, FrameStats) {
    let pipeline = overhead_pipeline();
    let mut ctx = SoftwareContext::new(SHADOW_RESOLUTION);
    let stats = pipeline.render_frame(&mut ctx, &camera(), drawables, Viewport::new(800, 600));
    (ctx, stats)
}

#[test]
fn frame_issues_depth_pass_then_lit_pass() {
    let mut hidden = box_at("hidden", 10.0, 10.0);
    hidden.visible = false;
    let drawables = [ground(), box_at("box", 0.0, 0.0), hidden];

    let (ctx, stats) = render(&drawables);

    let draw = |name: &str, mode| RenderCommand::Draw {
        drawable: name.to_string(),
        mode,
    };
    assert_eq!(
        ctx.commands(),
        &[
            RenderCommand::BindDepthTarget,
            RenderCommand::SetViewport(Viewport::square(SHADOW_RESOLUTION)),
            RenderCommand::Clear(ClearBuffers::Depth),
            draw("box", PassMode::DepthOnly),
            RenderCommand::UnbindDepthTarget,
            RenderCommand::SetViewport(Viewport::new(800, 600)),
            RenderCommand::Clear(ClearBuffers::ColorDepth),
            RenderCommand::BindShadowMap(SHADOW_MAP_SLOT),
            RenderCommand::DrawSky,
            draw("ground", PassMode::Lit),
            draw("box", PassMode::Lit),
        ]
    );
    assert_eq!(
        stats,
        FrameStats {
            shadow_casters: 1,
            lit_draws: 2
        }
    );
}

#[test]
fn sky_is_drawn_once_per_frame_even_with_nothing_visible() {
    let (ctx, stats) = render(&[]);

    let skies = ctx
        .commands()
        .iter()
        .filter(|c| matches!(c, RenderCommand::DrawSky))
        .count();
    assert_eq!(skies, 1);
    assert_eq!(stats, FrameStats::default());
    assert_eq!(ctx.commands().last(), Some(&RenderCommand::DrawSky));
}

#[test]
fn shadows_do_not_outlive_their_caster() {
    let pipeline = overhead_pipeline();
    let mut ctx = SoftwareContext::new(SHADOW_RESOLUTION);
    let under_box = Point3::new(0.0, 0.0, 0.0);

    pipeline.render_frame(&mut ctx, &camera(), &[ground(), box_at("box", 0.0, 0.0)], Viewport::new(800, 600));
    assert!(ctx.shadow_factor_at(under_box) < 1.0);

    let stats = pipeline.render_frame(&mut ctx, &camera(), &[ground()], Viewport::new(800, 600));
    assert_eq!(stats.shadow_casters, 0);
    assert_eq!(ctx.shadow_factor_at(under_box), 1.0);
    let depth = ctx.depth_target();
    assert!((0..depth.height()).all(|y| (0..depth.width()).all(|x| depth.get(x, y) == 1.0)));
}

#[test]
fn ground_under_the_box_is_shadowed() {
    let (ctx, _) = render(&[ground(), box_at("box", 0.0, 0.0)]);

    assert!(ctx.shadow_factor_at(Point3::new(0.0, 0.0, 0.0)) < 1.0);
    assert!(ctx.shadow_factor_at(Point3::new(1.5, 0.0, -1.5)) < 1.0);
    assert_eq!(ctx.shadow_factor_at(Point3::new(15.0, 0.0, 15.0)), 1.0);
    // Outside the light volume
    assert_eq!(ctx.shadow_factor_at(Point3::new(60.0, 0.0, 0.0)), 1.0);
}

#[test]
fn box_top_does_not_shadow_itself() {
    let (ctx, _) = render(&[ground(), box_at("box", 0.0, 0.0)]);
    assert_eq!(ctx.shadow_factor_at(Point3::new(0.0, 2.0, 0.0)), 1.0);
}

#[test]
fn non_casters_leave_the_shadow_map_empty() {
    let mut ghost = box_at("ghost", 0.0, 0.0);
    ghost.casts_shadows = false;
    let (ctx, stats) = render(&[ground(), ghost]);

    assert_eq!(stats.shadow_casters, 0);
    assert_eq!(ctx.shadow_factor_at(Point3::new(0.0, 0.0, 0.0)), 1.0);
    assert!(!ctx
        .commands()
        .iter()
        .any(|c| matches!(c, RenderCommand::Draw { mode: PassMode::DepthOnly, .. })));
}

#[test]
fn invisible_drawables_are_not_drawn_at_all() {
    let mut hidden = box_at("hidden", 0.0, 0.0);
    hidden.visible = false;
    let (ctx, stats) = render(&[hidden]);

    assert_eq!(stats, FrameStats::default());
    assert!(!ctx.commands().iter().any(|c| matches!(c, RenderCommand::Draw { .. })));
}

#[test]
fn every_instance_casts_a_shadow() {
    let instances = Arc::new(InstanceSet::new(vec![
        Matrix4::from_translation(Vector3::new(-8.0, 1.0, 0.0)) * Matrix4::from_nonuniform_scale(4.0, 2.0, 4.0),
        Matrix4::from_translation(Vector3::new(8.0, 1.0, 0.0)) * Matrix4::from_nonuniform_scale(4.0, 2.0, 4.0),
    ]));
    let rocks = Drawable::instanced("rocks", vec![cube()], instances);
    let (ctx, _) = render(&[ground(), rocks]);

    assert!(ctx.shadow_factor_at(Point3::new(-8.0, 0.0, 0.0)) < 1.0);
    assert!(ctx.shadow_factor_at(Point3::new(8.0, 0.0, 0.0)) < 1.0);
    assert_eq!(ctx.shadow_factor_at(Point3::new(0.0, 0.0, 0.0)), 1.0);
}

#[test]
fn skinned_shadow_follows_the_joint_palette() {
    let mut skinned = Drawable::skinned("skinned", vec![cube()], 1).unwrap();
    skinned.set_transform_trs(Vector3::new(0.0, 1.0, 0.0), cgmath::Deg(0.0), Vector3::new(4.0, 2.0, 4.0));
    // Joint space is the mesh's model space: 2.5 units of x become 10 world units
    skinned
        .set_joint_matrices(&[Matrix4::from_translation(Vector3::new(2.5, 0.0, 0.0))])
        .unwrap();

    let (ctx, _) = render(&[ground(), skinned]);

    assert!(ctx.shadow_factor_at(Point3::new(10.0, 0.0, 0.0)) < 1.0);
    assert_eq!(ctx.shadow_factor_at(Point3::new(0.0, 0.0, 0.0)), 1.0);
}

#[test]
fn scene_shader_parses() {
    let source = include_str!("../src/gfx/rendering/scene.wgsl");
    let module = naga::front::wgsl::parse_str(source).unwrap();

    let entry_points: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    for name in ["vs_depth", "vs_main", "fs_main"] {
        assert!(entry_points.contains(&name), "missing entry point {}", name);
    }
}

#[test]
fn sky_shader_parses() {
    let source = include_str!("../src/gfx/rendering/sky.wgsl");
    let module = naga::front::wgsl::parse_str(source).unwrap();

    let entry_points: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(entry_points, ["vs_sky", "fs_sky"]);
}

#[test]
fn missing_model_is_reported_with_its_path() {
    let err = load_obj("assets/nowhere/tree.obj").unwrap_err();
    assert!(matches!(err, RenderError::AssetLoad { .. }));
    assert!(err.to_string().contains("assets/nowhere/tree.obj"));
}
