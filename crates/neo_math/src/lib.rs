//! # neo_math
//!
//! Math types for the Neo engine. Re-exports [`glam`] for linear algebra and
//! defines the spatial and camera components that implement
//! [`Component`](neo_component::Component).

pub mod camera;
pub mod spatial;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use camera::Camera;
pub use spatial::Spatial;
