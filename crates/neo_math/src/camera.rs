//! Perspective camera component.

use glam::{Mat4, Vec3};
use neo_component::Component;
use serde::{Deserialize, Serialize};

use crate::spatial::Spatial;

/// A perspective camera. Its world position comes from the entity's
/// [`Spatial`]; the camera itself only stores projection and look direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    /// Vertical field of view, in degrees.
    pub fov: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// World-space direction the camera looks towards.
    pub look_dir: Vec3,
}

impl Camera {
    /// Create a camera with the given vertical field of view in degrees.
    #[must_use]
    pub fn new(fov: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            near,
            far,
            look_dir: Vec3::NEG_Z,
        }
    }

    /// Point the camera at `target` as seen from `spatial`.
    pub fn look_at(&mut self, spatial: &Spatial, target: Vec3) {
        let dir = target - spatial.position;
        if dir.length_squared() > f32::EPSILON {
            self.look_dir = dir.normalize();
        }
    }

    /// Right-handed perspective projection for the given aspect ratio.
    #[must_use]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// View matrix for a camera placed at `spatial`.
    #[must_use]
    pub fn view(&self, spatial: &Spatial) -> Mat4 {
        Mat4::look_to_rh(spatial.position, self.look_dir, Vec3::Y)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(45.0, 0.1, 100.0)
    }
}

impl Component for Camera {
    fn type_name() -> &'static str {
        "Camera"
    }
}
