//! # Scene Module
//!
//! Everything that gets drawn: meshes, drawables, the vertex formats they are
//! stored in, and the field scene built from them.
//!
//! - [`Drawable`] - meshes plus a model transform, drawn as a static,
//!   instanced or skinned mesh
//! - [`Scene`] - ordered list of drawables
//! - [`Field`] - the demo's ground, trees, grass and skinned pole
//! - [`Vertex3D`] - position, normal and joint influences
//!
//! ```no_run
//! use meadow::config::SceneConfig;
//! use meadow::gfx::scene::Field;
//!
//! let field = Field::build(&SceneConfig::default()).unwrap();
//! for drawable in field.drawables() {
//!     println!("{} casts shadows: {}", drawable.name, drawable.casts_shadows);
//! }
//! ```

pub mod drawable;
pub mod field;
pub mod scene;
pub mod vertex;

pub use drawable::{Drawable, DrawableKind, InstanceSet, Mesh};
pub use field::Field;
pub use scene::{load_obj, Scene};
pub use vertex::{InstanceRaw, Vertex3D};
