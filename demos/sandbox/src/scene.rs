//! The sandbox scene: a controllable camera, a light, and a row of cubes,
//! some of them bobbing.

use neo_component::{ComponentStore, EcsError, Entity};
use neo_math::{Camera, Spatial, Vec3};
use tracing::info;

use components::{CameraController, Light, MainCamera, Material, MeshRef, Name, SineMovement};

/// Cubes in the row.
const CUBES: usize = 5;

/// Populate `store` and return the main camera entity.
pub fn populate(store: &mut ComponentStore) -> Result<Entity, EcsError> {
    let camera = store.create_entity();
    let eye = Spatial::from_position(Vec3::new(0.0, 2.0, 10.0));
    let mut lens = Camera::default();
    lens.look_at(&eye, Vec3::ZERO);
    store.add_component(camera, eye)?;
    store.add_component(camera, lens)?;
    store.add_component(camera, MainCamera)?;
    store.add_component(camera, CameraController::default())?;
    store.add_component(camera, Name::new("Main Camera"))?;

    let lamp = store.create_entity();
    store.add_component(lamp, Spatial::from_position(Vec3::new(2.0, 5.0, 2.0)))?;
    store.add_component(
        lamp,
        Light::new(Vec3::splat(0.1), Vec3::new(1.0, 0.95, 0.9), Vec3::ONE)
            .with_attenuation(1.0, 0.09, 0.032),
    )?;
    store.add_component(lamp, Name::new("Lamp"))?;

    for i in 0..CUBES {
        let x = (i as f32 - (CUBES as f32 - 1.0) / 2.0) * 2.5;
        let cube = store.create_entity();
        store.add_component(cube, Spatial::from_position(Vec3::new(x, 0.0, 0.0)))?;
        store.add_component(cube, MeshRef::new("cube.obj"))?;
        store.add_component(
            cube,
            Material::solid(Vec3::new(0.2 + 0.15 * i as f32, 0.4, 0.8)),
        )?;
        store.add_component(cube, Name::new(format!("Cube {i}")))?;
        if i % 2 == 0 {
            let mut sine = SineMovement::new(Vec3::Y, 1.0, 0.5);
            sine.phase = i as f32 * 0.6;
            store.add_component(cube, sine)?;
        }
    }

    info!(entities = store.entity_count(), "scene populated");
    Ok(camera)
}
