//! The field scene: ground, trees, grass and a skinned pole
//!
//! Only the trees and the pole cast shadows. The ground is a flat slab that
//! is re-centred under the camera every frame so it never runs out.

use std::sync::Arc;

use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector2, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::drawable::{Drawable, InstanceSet, Mesh};
use super::scene::{load_obj, Scene};
use super::vertex::Vertex3D;
use crate::config::SceneConfig;
use crate::error::Result;
use crate::gfx::geometry::{generate_cube, generate_grass_blade};

pub const GROUND_EXTENT: f32 = 100_000.0;
/// Grass blades are centred this far above the ground plane
pub const GRASS_LIFT: f32 = 1.45;
pub const GRASS_SCALE: [f32; 3] = [1.0, 2.5, 1.0];

const TRUNK_HEIGHT: f32 = 8.0;
const CROWN_SIZE: [f32; 3] = [6.0, 5.0, 6.0];
const CROWN_COLOR: [f32; 3] = [0.15, 0.45, 0.2];
const TREE_SPREAD: f32 = 100.0;

const POLE_POSITION: [f32; 3] = [50.0, 0.0, 1.0];
const POLE_HEIGHT: f32 = 6.0;
const POLE_SWAY: Deg<f32> = Deg(15.0);

pub struct Field {
    scene: Scene,
    ground: usize,
    pole: Option<usize>,
    ground_y: f32,
}

impl Field {
    /// Assembles the field. Fails only if the configured tree OBJ cannot be loaded.
    pub fn build(config: &SceneConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut scene = Scene::new();
        let cube = Arc::new(generate_cube().into_mesh("cube")?);

        let mut ground = Drawable::new("ground", vec![cube.clone()])
            .with_color(config.ground_color[0], config.ground_color[1], config.ground_color[2])?;
        ground.casts_shadows = false;
        let ground = scene.add(ground);

        let tree_meshes = match &config.tree_obj {
            Some(path) => Some(load_obj(path)?),
            None => None,
        };
        for (i, position) in tree_positions(config.tree_count, &mut rng).into_iter().enumerate() {
            let base = Vector3::new(position.x, config.ground_y, position.y);
            match &tree_meshes {
                Some(meshes) => {
                    let mut tree = Drawable::new(format!("tree_{}", i), meshes.clone())
                        .with_color(config.tree_color[0], config.tree_color[1], config.tree_color[2])?;
                    tree.transform = Matrix4::from_translation(base)
                        * Matrix4::from_angle_x(Deg(270.0))
                        * Matrix4::from_nonuniform_scale(0.05, 0.09, 0.05);
                    scene.add(tree);
                }
                None => {
                    let (trunk, crown) = procedural_tree(i, &cube, base, config.tree_color)?;
                    scene.add(trunk);
                    scene.add(crown);
                }
            }
        }

        if config.grass_count > 0 {
            let blade = Arc::new(generate_grass_blade().into_mesh("grass_blade")?);
            let instances = Arc::new(InstanceSet::new(scatter_grass(
                config.grass_count,
                config.ground_y,
                &mut rng,
            )));
            let mut grass = Drawable::instanced("grass", vec![blade], instances)
                .with_color(config.grass_color[0], config.grass_color[1], config.grass_color[2])?;
            grass.casts_shadows = false;
            scene.add(grass);
        }

        let pole = if config.character {
            let mut pole = Drawable::skinned("pole", vec![Arc::new(skinned_pole()?)], 2)?
                .with_color(0.6, 0.2, 0.25)?;
            pole.set_translation(Vector3::new(
                POLE_POSITION[0],
                POLE_POSITION[1] + config.ground_y + 0.5 + POLE_HEIGHT / 2.0,
                POLE_POSITION[2],
            ));
            Some(scene.add(pole))
        } else {
            None
        };

        log::info!(
            "Field built: {} drawables, {} grass blades, {} tree(s)",
            scene.len(),
            config.grass_count,
            config.tree_count
        );

        let mut field = Self {
            scene,
            ground,
            pole,
            ground_y: config.ground_y,
        };
        field.follow_camera(Point3::new(0.0, 0.0, 0.0));
        Ok(field)
    }

    /// Re-centres the ground slab under the camera in x/z.
    pub fn follow_camera(&mut self, camera_position: Point3<f32>) {
        let ground_y = self.ground_y;
        if let Some(ground) = self.scene.get_mut(self.ground) {
            ground.transform = Matrix4::from_translation(Vector3::new(camera_position.x, ground_y, camera_position.z))
                * Matrix4::from_nonuniform_scale(GROUND_EXTENT, 1.0, GROUND_EXTENT);
        }
    }

    /// Sways the pole's upper joint with `elapsed` seconds of animation time.
    pub fn animate(&mut self, elapsed: f32) -> Result<()> {
        let Some(pole) = self.pole.and_then(|index| self.scene.get_mut(index)) else {
            return Ok(());
        };
        let angle = POLE_SWAY * elapsed.sin();
        pole.set_joint_matrices(&[Matrix4::identity(), Matrix4::from_angle_z(angle)])
    }

    pub fn drawables(&self) -> &[Drawable] {
        self.scene.drawables()
    }
}

/// Tree footprint centres in x/z. The first tree stands at the origin.
fn tree_positions(count: usize, rng: &mut impl Rng) -> Vec<Vector2<f32>> {
    let range = count as f32 * TREE_SPREAD;
    (0..count)
        .map(|i| {
            if i == 0 {
                Vector2::new(0.0, 0.0)
            } else {
                Vector2::new(
                    rng.random::<f32>() * range - range / 2.0,
                    rng.random::<f32>() * range - range / 2.0,
                )
            }
        })
        .collect()
}

fn procedural_tree(index: usize, cube: &Arc<Mesh>, base: Vector3<f32>, color: [f32; 3]) -> Result<(Drawable, Drawable)> {
    // The ground slab's top face sits half a unit above ground_y
    let ground_top = base.y + 0.5;

    let mut trunk = Drawable::new(format!("tree_{}_trunk", index), vec![cube.clone()])
        .with_color(color[0], color[1], color[2])?;
    trunk.set_transform_trs(
        Vector3::new(base.x, ground_top + TRUNK_HEIGHT / 2.0, base.z),
        Deg(0.0),
        Vector3::new(1.0, TRUNK_HEIGHT, 1.0),
    );

    let mut crown = Drawable::new(format!("tree_{}_crown", index), vec![cube.clone()])
        .with_color(CROWN_COLOR[0], CROWN_COLOR[1], CROWN_COLOR[2])?;
    crown.set_transform_trs(
        Vector3::new(base.x, ground_top + TRUNK_HEIGHT + CROWN_SIZE[1] / 2.0, base.z),
        Deg(45.0),
        Vector3::from(CROWN_SIZE),
    );

    Ok((trunk, crown))
}

/// Scatters `count` blades over a `sqrt(count)` square centred on the origin,
/// each turned by a random 0-90 degrees about Y.
pub fn scatter_grass(count: usize, ground_y: f32, rng: &mut impl Rng) -> Vec<Matrix4<f32>> {
    let range = (count as f32).sqrt();
    let grass_y = ground_y + GRASS_LIFT;

    (0..count)
        .map(|_| {
            let angle = Deg(rng.random::<f32>() * 90.0);
            let x = rng.random::<f32>() * range - range / 2.0;
            let z = rng.random::<f32>() * range - range / 2.0;
            Matrix4::from_translation(Vector3::new(x, grass_y, z))
                * Matrix4::from_angle_y(angle)
                * Matrix4::from_nonuniform_scale(GRASS_SCALE[0], GRASS_SCALE[1], GRASS_SCALE[2])
        })
        .collect()
}

/// A unit-wide box of height [`POLE_HEIGHT`] whose upper half follows joint 1.
fn skinned_pole() -> Result<Mesh> {
    let cube = generate_cube();
    let vertices = cube
        .vertices
        .iter()
        .zip(&cube.normals)
        .map(|(position, normal)| {
            let scaled = [position[0], position[1] * POLE_HEIGHT, position[2]];
            let joint = if scaled[1] > 0.0 { 1 } else { 0 };
            Vertex3D::skinned(scaled, *normal, [joint, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])
        })
        .collect();
    Mesh::new("pole", vertices, cube.indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Transform;

    fn small_config() -> SceneConfig {
        SceneConfig {
            grass_count: 16,
            ..Default::default()
        }
    }

    #[test]
    fn only_trees_and_pole_cast_shadows() {
        let field = Field::build(&small_config()).unwrap();
        let casters: Vec<_> = field
            .drawables()
            .iter()
            .filter(|d| d.casts_shadows)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(casters, ["tree_0_trunk", "tree_0_crown", "pole"]);
    }

    #[test]
    fn ground_follows_camera() {
        let mut field = Field::build(&small_config()).unwrap();
        field.follow_camera(Point3::new(12.0, 40.0, -7.0));
        let ground = &field.drawables()[0];
        let centre = ground.transform.transform_point(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(centre, Point3::new(12.0, -3.0, -7.0));
    }

    #[test]
    fn grass_stays_in_its_square() {
        let mut rng = StdRng::seed_from_u64(7);
        let blades = scatter_grass(100, -3.0, &mut rng);
        assert_eq!(blades.len(), 100);
        for blade in blades {
            let origin = blade.transform_point(Point3::new(0.0, 0.0, 0.0));
            assert!(origin.x.abs() <= 5.0 && origin.z.abs() <= 5.0);
            assert!((origin.y - (-3.0 + GRASS_LIFT)).abs() < 1e-6);
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = scatter_grass(10, 0.0, &mut StdRng::seed_from_u64(1));
        let b = scatter_grass(10, 0.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn pole_sways_only_at_the_top() {
        let mut field = Field::build(&small_config()).unwrap();
        field.animate(std::f32::consts::FRAC_PI_2).unwrap();
        let pole = field.drawables().iter().find(|d| d.name == "pole").unwrap();
        assert_eq!(pole.joint_matrices()[0], Matrix4::identity());

        let mesh = &pole.meshes[0];
        for vertex in mesh.vertices() {
            let skinned = pole.skin_position(vertex);
            if vertex.position[1] < 0.0 {
                assert_eq!(skinned, Point3::from(vertex.position));
            } else {
                assert_ne!(skinned, Point3::from(vertex.position));
            }
        }
    }

    #[test]
    fn missing_tree_model_fails_the_build() {
        let config = SceneConfig {
            tree_obj: Some("no/such/tree.obj".into()),
            ..small_config()
        };
        assert!(Field::build(&config).is_err());
    }
}
