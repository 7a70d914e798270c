//! Sine movement: oscillates entities around the position they started at.

use neo_component::ComponentStore;
use neo_math::Spatial;
use neo_message::SpatialChangeMessage;
use neo_system::{System, SystemContext};
use serde_json::json;

use components::SineMovement;

/// Moves every entity with both [`Spatial`] and [`SineMovement`], and
/// announces each move with a targeted [`SpatialChangeMessage`].
#[derive(Debug, Default)]
pub struct SineMovementSystem;

impl System for SineMovementSystem {
    fn name(&self) -> &'static str {
        "sine_movement"
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        let time = ctx.frame.elapsed as f32;

        for entity in ctx.store.query_entities::<(Spatial, SineMovement)>() {
            let Some(sine) = ctx.store.get_component::<SineMovement>(entity).copied() else {
                continue;
            };
            let Some(spatial) = ctx.store.get_component_mut::<Spatial>(entity) else {
                continue;
            };
            let origin = sine.origin.unwrap_or(spatial.position);
            spatial.position = origin + sine.offset(time);

            if sine.origin.is_none()
                && let Some(stored) = ctx.store.get_component_mut::<SineMovement>(entity)
            {
                stored.origin = Some(origin);
            }

            ctx.bus.send_to(entity, SpatialChangeMessage { entity });
        }
        Ok(())
    }

    fn inspect(&self, store: &ComponentStore) -> Option<serde_json::Value> {
        Some(json!({ "moving": store.query_entities::<(Spatial, SineMovement)>().len() }))
    }
}
