//! The spatial component.
//!
//! [`Spatial`] places an entity in the world. Cameras, lights and anything
//! drawable carry one; [`SpatialChangeMessage`] is sent when it moves.
//!
//! [`SpatialChangeMessage`]: https://docs.rs/neo_message

use glam::{Mat4, Quat, Vec3};
use neo_component::Component;
use serde::{Deserialize, Serialize};

/// Position, orientation and scale in world space.
///
/// Local axes follow the right-handed GL convention: `-Z` is forward, `+X`
/// is right and `+Y` is up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Spatial {
    /// World-space position.
    pub position: Vec3,
    /// Orientation; kept normalised by [`Spatial::rotated`].
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Spatial {
    /// At the origin, unrotated, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Unrotated and unscaled, at `position`.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self::IDENTITY.translated(position)
    }

    /// Unscaled, at `position`, facing along `rotation`.
    #[must_use]
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            rotation: rotation.normalize(),
            ..Self::from_position(position)
        }
    }

    /// Local-to-world matrix (scale, then rotate, then translate).
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// World direction of local `-Z`.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// World direction of local `+X`.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// World direction of local `+Y`.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Moved by `offset` in world space.
    #[must_use]
    pub fn translated(self, offset: Vec3) -> Self {
        Self {
            position: self.position + offset,
            ..self
        }
    }

    /// Turned by `rotation` in world space. The result is re-normalised so
    /// repeated small turns don't drift.
    #[must_use]
    pub fn rotated(self, rotation: Quat) -> Self {
        Self {
            rotation: (rotation * self.rotation).normalize(),
            ..self
        }
    }

    /// Uniformly scaled by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            scale: self.scale * factor,
            ..self
        }
    }
}

impl Default for Spatial {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Spatial {
    fn type_name() -> &'static str {
        "Spatial"
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;

    #[test]
    fn test_identity_basis() {
        let s = Spatial::default();
        assert_eq!(s.model_matrix(), Mat4::IDENTITY);
        assert_eq!(s.forward(), Vec3::NEG_Z);
        assert_eq!(s.right(), Vec3::X);
        assert_eq!(s.up(), Vec3::Y);
    }

    #[test]
    fn test_basis_after_yaw() {
        let s = Spatial::IDENTITY.rotated(Quat::from_rotation_y(FRAC_PI_2));
        assert!(s.forward().abs_diff_eq(Vec3::NEG_X, 1e-5));
        assert!(s.right().abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert!(s.up().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_basis_after_pitch() {
        // Pitching up a quarter turn points forward at the sky.
        let s = Spatial::IDENTITY.rotated(Quat::from_rotation_x(FRAC_PI_2));
        assert!(s.forward().abs_diff_eq(Vec3::Y, 1e-5));
        assert!(s.up().abs_diff_eq(Vec3::Z, 1e-5));
        assert!(s.right().abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_rotated_stays_normalised() {
        let step = Quat::from_rotation_y(0.01);
        let mut s = Spatial::IDENTITY;
        for _ in 0..10_000 {
            s = s.rotated(step);
        }
        assert!((s.rotation.length() - 1.0).abs() < 1e-5);

        // A non-unit input is normalised as well.
        let skewed = Spatial::IDENTITY.rotated(Quat::from_xyzw(0.0, 2.0, 0.0, 0.0));
        assert!((skewed.rotation.length() - 1.0).abs() < 1e-6);
        assert!(skewed.forward().abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn test_rotation_composes_in_world_space() {
        let half = Quat::from_rotation_y(PI / 2.0);
        let s = Spatial::from_position(Vec3::new(3.0, 0.0, 0.0))
            .rotated(half)
            .rotated(half);
        // Rotation leaves position alone and two quarter turns face backward.
        assert_eq!(s.position, Vec3::new(3.0, 0.0, 0.0));
        assert!(s.forward().abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn test_model_matrix_order() {
        let s = Spatial::from_position_rotation(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_z(FRAC_PI_2))
            .scaled(2.0);
        // (1, 0, 0) scales to (2, 0, 0), rotates to (0, 2, 0), then moves by +X.
        let p = s.model_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn test_inspection_json() {
        let s = Spatial::from_position(Vec3::new(1.0, 2.0, 3.0));
        let value = serde_json::to_value(s).unwrap();
        assert_eq!(value["position"], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(value["scale"], serde_json::json!([1.0, 1.0, 1.0]));
    }
}
