//! Directional light
//!
//! The light is modelled as an orthographic "camera" placed at `position` and
//! looking along `direction`. Its view and projection define the light-space
//! transform shared by the depth pass and the shadow test.

use cgmath::{ortho, InnerSpace, Matrix4, Point3, Vector3};

use crate::config::LightConfig;
use crate::error::{RenderError, Result};
use crate::gfx::camera::camera_utils::OPENGL_TO_WGPU_MATRIX;

/// The orthographic box covered by the shadow map, in light view space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoVolume {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthoVolume {
    fn default() -> Self {
        Self {
            left: -100.0,
            right: 100.0,
            bottom: -100.0,
            top: 100.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Shading terms of the directional light. Colours are linear RGB in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightParams {
    pub direction: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub color: [f32; 3],
}

impl Default for DirectionalLightParams {
    fn default() -> Self {
        Self {
            direction: [0.0, -1.0, 0.0],
            ambient: [0.2; 3],
            diffuse: [0.5; 3],
            specular: [1.0; 3],
            color: [1.0; 3],
        }
    }
}

impl DirectionalLightParams {
    pub fn validate(&self) -> Result<()> {
        let direction = Vector3::from(self.direction);
        if !direction.x.is_finite()
            || !direction.y.is_finite()
            || !direction.z.is_finite()
            || direction.magnitude2() == 0.0
        {
            return Err(RenderError::InvalidLightParams(format!(
                "direction must be a finite, non-zero vector, got {:?}",
                self.direction
            )));
        }

        for (name, value) in [
            ("ambient", self.ambient),
            ("diffuse", self.diffuse),
            ("specular", self.specular),
            ("color", self.color),
        ] {
            if value.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(RenderError::InvalidLightParams(format!(
                    "{} must lie in [0, 1], got {:?}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    position: Point3<f32>,
    direction: Vector3<f32>,
    volume: OrthoVolume,
    params: DirectionalLightParams,
}

impl DirectionalLight {
    /// `direction` is normalised; shading parameters start at their defaults
    /// with the same direction.
    pub fn new(position: Point3<f32>, direction: Vector3<f32>, volume: OrthoVolume) -> Self {
        let direction = direction.normalize();
        Self {
            position,
            direction,
            volume,
            params: DirectionalLightParams {
                direction: direction.into(),
                ..Default::default()
            },
        }
    }

    pub fn from_config(config: &LightConfig) -> Self {
        Self::new(
            Point3::from(config.position),
            Vector3::from(config.direction),
            config.volume,
        )
        .with_params(config.params)
    }

    pub fn with_params(mut self, params: DirectionalLightParams) -> Self {
        self.params = params;
        self
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn volume(&self) -> &OrthoVolume {
        &self.volume
    }

    pub fn params(&self) -> &DirectionalLightParams {
        &self.params
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        // World up is degenerate for lights pointing straight up or down
        let up = if self.direction.y.abs() > 0.999 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        Matrix4::look_at_rh(self.position, self.position + self.direction, up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let v = &self.volume;
        OPENGL_TO_WGPU_MATRIX * ortho(v.left, v.right, v.bottom, v.top, v.near, v.far)
    }

    /// Light projection x light view
    pub fn light_space_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}
