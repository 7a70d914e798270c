//! Sample component definitions for the Neo sandbox.
//!
//! These show how game data satisfies the [`Component`] contract: a plain
//! `Serialize` struct plus a type name. The engine's own components
//! ([`Spatial`](neo_math::Spatial), [`Camera`](neo_math::Camera)) live in
//! `neo_math`.

use neo_component::Component;
use neo_math::Vec3;
use serde::{Deserialize, Serialize};

/// Reference to a mesh asset, resolved against the resource directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeshRef {
    /// Path or identifier of the mesh asset.
    pub asset_path: String,
}

impl MeshRef {
    /// Create a new mesh reference.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            asset_path: path.into(),
        }
    }
}

impl Component for MeshRef {
    fn type_name() -> &'static str {
        "MeshRef"
    }
}

/// Surface appearance of a mesh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    /// Base colour, linear RGB.
    pub diffuse: Vec3,
    /// Highlight colour, linear RGB.
    pub specular: Vec3,
    /// Specular exponent.
    pub shininess: f32,
    /// Optional diffuse texture asset.
    pub texture: Option<String>,
}

impl Material {
    /// An untextured material with a white highlight.
    #[must_use]
    pub fn solid(diffuse: Vec3) -> Self {
        Self {
            diffuse,
            ..Self::default()
        }
    }

    /// Attach a diffuse texture.
    #[must_use]
    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = Some(path.into());
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ONE,
            shininess: 32.0,
            texture: None,
        }
    }
}

impl Component for Material {
    fn type_name() -> &'static str {
        "Material"
    }
}

/// A point light. Position comes from the entity's `Spatial`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Light {
    /// Ambient colour contribution.
    pub ambient: Vec3,
    /// Diffuse colour contribution.
    pub diffuse: Vec3,
    /// Specular colour contribution.
    pub specular: Vec3,
    /// Constant, linear and quadratic attenuation terms.
    pub attenuation: Vec3,
}

impl Light {
    /// A white light with the given colour contributions and no falloff.
    #[must_use]
    pub fn new(ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
        }
    }

    /// Set the attenuation terms.
    #[must_use]
    pub fn with_attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.attenuation = Vec3::new(constant, linear, quadratic);
        self
    }

    /// Intensity multiplier at `distance` from the light.
    #[must_use]
    pub fn falloff(&self, distance: f32) -> f32 {
        let Vec3 { x: c, y: l, z: q } = self.attenuation;
        let denom = c + l * distance + q * distance * distance;
        if denom <= f32::EPSILON { 1.0 } else { 1.0 / denom }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::splat(0.1), Vec3::ONE, Vec3::ONE)
    }
}

impl Component for Light {
    fn type_name() -> &'static str {
        "Light"
    }
}

/// Oscillates an entity along an axis around its starting position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SineMovement {
    /// Direction of travel; normalised on use.
    pub axis: Vec3,
    /// Peak distance from the origin, in world units.
    pub amplitude: f32,
    /// Oscillations per second.
    pub frequency: f32,
    /// Phase offset in radians.
    pub phase: f32,
    /// Centre of the motion. Captured from the `Spatial` on first update.
    pub origin: Option<Vec3>,
}

impl SineMovement {
    /// Create a movement along `axis`.
    #[must_use]
    pub fn new(axis: Vec3, amplitude: f32, frequency: f32) -> Self {
        Self {
            axis,
            amplitude,
            frequency,
            phase: 0.0,
            origin: None,
        }
    }

    /// Displacement from the origin at `time` seconds.
    #[must_use]
    pub fn offset(&self, time: f32) -> Vec3 {
        let angle = std::f32::consts::TAU * self.frequency * time + self.phase;
        self.axis.normalize_or_zero() * self.amplitude * angle.sin()
    }
}

impl Component for SineMovement {
    fn type_name() -> &'static str {
        "SineMovement"
    }
}

/// A display name for debugging and the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Name {
    /// The entity's display name.
    pub value: String,
}

impl Name {
    /// Create a new name component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { value: name.into() }
    }
}

impl Component for Name {
    fn type_name() -> &'static str {
        "Name"
    }
}

/// Tag marking the camera the renderer draws from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MainCamera;

impl Component for MainCamera {
    fn type_name() -> &'static str {
        "MainCamera"
    }
}

/// Movement tuning for a player-driven camera.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraController {
    /// Translation speed, world units per second.
    pub move_speed: f32,
    /// Yaw speed, radians per second.
    pub turn_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            turn_speed: 1.5,
        }
    }
}

impl Component for CameraController {
    fn type_name() -> &'static str {
        "CameraController"
    }
}
