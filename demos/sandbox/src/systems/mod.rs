//! Systems that make up the sandbox scene, in the order they are scheduled.

mod camera_controller;
mod render;
mod sine_movement;

pub use camera_controller::CameraControllerSystem;
pub use render::{LogRenderer, RenderSystem};
pub use sine_movement::SineMovementSystem;
