//! Application configuration
//!
//! Typed settings for the window, camera, light, shadow map, sky and field
//! scene.
//! Defaults describe the stock field demo; a handful of environment
//! variables can override them at startup (see [`AppConfig::from_env`]).

use std::path::PathBuf;

use crate::error::{RenderError, Result};
use crate::gfx::rendering::light::{DirectionalLightParams, OrthoVolume};

/// Window settings
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Renderer".to_string(),
            width: 1600,
            height: 1200,
            vsync: false,
        }
    }
}

/// Camera intrinsics and control speeds
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    /// Distance covered by one movement step
    pub move_speed: f32,
    /// Degrees of yaw/pitch per pixel of cursor travel
    pub angular_speed: f32,
    /// Steps per second used to make movement frame-rate independent.
    /// `None` moves exactly one step per frame.
    pub reference_rate: Option<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: 60.0,
            near: 0.1,
            far: 1000.0,
            move_speed: 0.5,
            angular_speed: 0.15,
            reference_rate: Some(60.0),
        }
    }
}

/// Directional light placement and shading
#[derive(Debug, Clone, Copy)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub volume: OrthoVolume,
    pub params: DirectionalLightParams,
}

impl Default for LightConfig {
    fn default() -> Self {
        let direction = [-0.71511, -0.624562, -0.313911];
        Self {
            position: [168.0, 160.5, 41.5],
            direction,
            volume: OrthoVolume::default(),
            params: DirectionalLightParams {
                direction,
                ..Default::default()
            },
        }
    }
}

/// Shadow map settings
#[derive(Debug, Clone, Copy)]
pub struct ShadowConfig {
    /// Edge length of the square depth target in texels
    pub resolution: u32,
    /// Subtracted from the fragment's light-space depth before comparing
    pub depth_bias: f32,
    /// Colour the main pass clears to
    pub clear_color: [f32; 4],
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            depth_bias: 0.005,
            clear_color: [0.5, 0.5, 0.5, 1.0],
        }
    }
}

/// Colours of the procedural night sky behind the scene
#[derive(Debug, Clone, Copy)]
pub struct SkyConfig {
    /// Colour straight up
    pub zenith_color: [f32; 3],
    /// Colour at and below the horizon
    pub horizon_color: [f32; 3],
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            zenith_color: [0.01, 0.015, 0.05],
            horizon_color: [0.09, 0.11, 0.2],
        }
    }
}

/// Contents of the field scene
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Height of the ground plane
    pub ground_y: f32,
    pub ground_color: [f32; 3],
    pub grass_count: usize,
    pub grass_color: [f32; 3],
    /// Optional OBJ model used for the trees instead of the procedural one
    pub tree_obj: Option<PathBuf>,
    pub tree_count: usize,
    pub tree_color: [f32; 3],
    /// Adds the swaying skinned pole next to the trees
    pub character: bool,
    /// Seed for grass and tree placement
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            ground_y: -3.0,
            ground_color: [0.1, 0.9, 0.35],
            grass_count: 100_000,
            grass_color: [0.2, 0.6, 0.25],
            tree_obj: None,
            tree_count: 1,
            tree_color: [0.35, 0.25, 0.15],
            character: true,
            seed: 0x5eed,
        }
    }
}

/// Top level configuration handed to [`crate::MeadowApp`]
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub shadow: ShadowConfig,
    pub sky: SkyConfig,
    pub scene: SceneConfig,
}

impl AppConfig {
    /// Builds the default configuration and applies environment overrides.
    ///
    /// Recognised variables:
    /// - `MEADOW_SHADOW_RESOLUTION` - shadow map edge length in texels
    /// - `MEADOW_GRASS_COUNT` - number of grass blades
    /// - `MEADOW_TREE_OBJ` - path to an OBJ model used for the trees
    /// - `MEADOW_VSYNC` - `1`/`true` to enable vsync
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MEADOW_SHADOW_RESOLUTION") {
            let resolution: u32 = parse_var("MEADOW_SHADOW_RESOLUTION", &value)?;
            if resolution == 0 {
                return Err(RenderError::Setup(
                    "MEADOW_SHADOW_RESOLUTION must be greater than zero".to_string(),
                ));
            }
            config.shadow.resolution = resolution;
        }

        if let Some(value) = lookup("MEADOW_GRASS_COUNT") {
            config.scene.grass_count = parse_var("MEADOW_GRASS_COUNT", &value)?;
        }

        if let Some(value) = lookup("MEADOW_TREE_OBJ") {
            if !value.is_empty() {
                config.scene.tree_obj = Some(PathBuf::from(value));
            }
        }

        if let Some(value) = lookup("MEADOW_VSYNC") {
            config.window.vsync = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(RenderError::Setup(format!(
                        "MEADOW_VSYNC expects a boolean, got '{}'",
                        other
                    )))
                }
            };
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| RenderError::Setup(format!("{} has invalid value '{}': {}", name, value, e)))
}
