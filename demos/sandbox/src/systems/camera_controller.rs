//! Camera controller: drives the main camera from an input source.
//!
//! The sandbox has no window, so input comes from a looping script of
//! [`InputFrame`]s. Each frame the controller yaws the camera, then moves it
//! along its look direction and its right vector.

use neo_math::{Camera, Quat, Spatial, Vec3};
use neo_message::SpatialChangeMessage;
use neo_system::{System, SystemContext};
use serde_json::json;
use tracing::debug;

use components::{CameraController, MainCamera};

/// One frame of controller input, each axis in `-1.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// Forward (+) / backward (-).
    pub forward: f32,
    /// Right (+) / left (-).
    pub strafe: f32,
    /// Turn left (+) / right (-).
    pub turn: f32,
}

/// Moves the entity tagged [`MainCamera`] that also has a [`CameraController`].
#[derive(Debug, Default)]
pub struct CameraControllerSystem {
    script: Vec<InputFrame>,
    cursor: usize,
    moved: u64,
}

impl CameraControllerSystem {
    /// Create a controller that replays `script` in a loop.
    #[must_use]
    pub fn new(script: Vec<InputFrame>) -> Self {
        Self {
            script,
            cursor: 0,
            moved: 0,
        }
    }

    /// A short orbit: walk forward, turn, strafe back.
    #[must_use]
    pub fn demo() -> Self {
        let walk = InputFrame {
            forward: 1.0,
            ..InputFrame::default()
        };
        let turn = InputFrame {
            turn: 1.0,
            ..InputFrame::default()
        };
        let strafe = InputFrame {
            strafe: -1.0,
            ..InputFrame::default()
        };
        let mut script = Vec::new();
        script.extend(std::iter::repeat_n(walk, 30));
        script.extend(std::iter::repeat_n(turn, 30));
        script.extend(std::iter::repeat_n(strafe, 30));
        Self::new(script)
    }

    /// Frames in which the camera actually moved.
    #[must_use]
    pub fn moved_frames(&self) -> u64 {
        self.moved
    }

    fn next_input(&mut self) -> InputFrame {
        let Some(input) = self.script.get(self.cursor).copied() else {
            return InputFrame::default();
        };
        self.cursor = (self.cursor + 1) % self.script.len();
        input
    }
}

impl System for CameraControllerSystem {
    fn name(&self) -> &'static str {
        "camera_controller"
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        let input = self.next_input();
        let dt = ctx.dt() as f32;

        let Some(entity) = ctx
            .store
            .get_component_tuple::<(Spatial, Camera, CameraController, MainCamera)>()
            .map(|t| t.entity())
        else {
            debug!("no controllable main camera");
            return Ok(());
        };

        if input == InputFrame::default() {
            return Ok(());
        }

        let controller = *ctx.store.require_component::<CameraController>(entity)?;
        let yaw = Quat::from_rotation_y(input.turn * controller.turn_speed * dt);

        let look_dir = {
            let camera = ctx
                .store
                .get_component_mut::<Camera>(entity)
                .ok_or_else(|| anyhow::anyhow!("main camera {entity} lost its Camera"))?;
            camera.look_dir = (yaw * camera.look_dir).normalize_or_zero();
            camera.look_dir
        };

        let right = look_dir.cross(Vec3::Y).normalize_or_zero();
        let step = (look_dir * input.forward + right * input.strafe) * controller.move_speed * dt;

        let spatial = ctx
            .store
            .get_component_mut::<Spatial>(entity)
            .ok_or_else(|| anyhow::anyhow!("main camera {entity} lost its Spatial"))?;
        *spatial = spatial.rotated(yaw).translated(step);

        ctx.bus.send_to(entity, SpatialChangeMessage { entity });
        self.moved += 1;
        Ok(())
    }

    fn inspect(&self, _store: &neo_component::ComponentStore) -> Option<serde_json::Value> {
        Some(json!({
            "script_len": self.script.len(),
            "cursor": self.cursor,
            "moved_frames": self.moved,
        }))
    }
}

#[cfg(test)]
mod tests {
    use neo_system::{Engine, EngineConfig};

    use super::*;

    fn camera_engine() -> (Engine, neo_component::Entity) {
        let mut engine = Engine::new(EngineConfig::default().with_target_fps(0.0));
        let store = engine.store_mut();
        let cam = store.create_entity();
        store.add_component(cam, Spatial::IDENTITY).unwrap();
        store.add_component(cam, Camera::default()).unwrap();
        store
            .add_component(
                cam,
                CameraController {
                    move_speed: 2.0,
                    turn_speed: 1.0,
                },
            )
            .unwrap();
        store.add_component(cam, MainCamera).unwrap();
        (engine, cam)
    }

    #[test]
    fn test_forward_input_moves_along_look_dir() {
        let (mut engine, cam) = camera_engine();
        let id = engine.add_system(CameraControllerSystem::new(vec![InputFrame {
            forward: 1.0,
            ..InputFrame::default()
        }]));

        engine.run_frame(0.5).unwrap();
        let spatial = engine.store().get_component::<Spatial>(cam).unwrap();
        assert!((spatial.position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);

        let system = engine
            .systems()
            .system::<CameraControllerSystem>(id)
            .unwrap();
        assert_eq!(system.moved_frames(), 1);
    }

    #[test]
    fn test_turn_rotates_look_dir() {
        let (mut engine, cam) = camera_engine();
        engine.add_system(CameraControllerSystem::new(vec![InputFrame {
            turn: 1.0,
            ..InputFrame::default()
        }]));

        engine.run_frame(std::f64::consts::FRAC_PI_2).unwrap();
        let camera = engine.store().get_component::<Camera>(cam).unwrap();
        // A quarter turn to the left takes -Z to -X.
        assert!((camera.look_dir - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_idle_frames_leave_camera_alone() {
        let (mut engine, cam) = camera_engine();
        let id = engine.add_system(CameraControllerSystem::new(vec![InputFrame::default()]));
        engine.run_frame(1.0).unwrap();
        assert_eq!(
            engine.store().get_component::<Spatial>(cam),
            Some(&Spatial::IDENTITY)
        );
        let system = engine.systems().system::<CameraControllerSystem>(id).unwrap();
        assert_eq!(system.moved_frames(), 0);
    }

    #[test]
    fn test_no_camera_is_not_an_error() {
        let mut engine = Engine::new(EngineConfig::default().with_target_fps(0.0));
        engine.add_system(CameraControllerSystem::demo());
        let report = engine.run_frame(0.016).unwrap();
        assert_eq!(report.executed.len(), 1);
        assert!(report.failed.is_empty());
    }
}
