//! Render system and the renderer backend seam.
//!
//! [`RenderSystem`] gathers everything drawable each frame and hands it to a
//! [`Renderer`]. The sandbox ships [`LogRenderer`], which records draw calls
//! to the log instead of a GPU.

use std::cell::Cell;
use std::rc::Rc;

use neo_component::{ComponentStore, Entity};
use neo_math::{Camera, Mat4, Spatial, Vec3};
use neo_message::{Subscription, WindowFrameSizeMessage};
use neo_system::{System, SystemContext};
use serde_json::json;
use tracing::{debug, trace};

use components::{Light, MainCamera, Material, MeshRef};

/// Per-frame camera data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// World to view space.
    pub view: Mat4,
    /// View to clip space.
    pub projection: Mat4,
    /// Camera position in world space.
    pub camera_position: Vec3,
}

/// A light as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    /// World-space position.
    pub position: Vec3,
    /// Colour and falloff.
    pub light: Light,
}

/// One mesh to draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// The entity being drawn.
    pub entity: Entity,
    /// Object to world space.
    pub model: Mat4,
    /// Mesh asset to bind.
    pub mesh: &'a MeshRef,
    /// Surface parameters.
    pub material: &'a Material,
}

/// Backend that turns draw calls into pixels (or log lines).
pub trait Renderer {
    /// Start a frame.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn begin_frame(&mut self, uniforms: &FrameUniforms, lights: &[LightData]) -> anyhow::Result<()>;

    /// Submit one mesh.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn draw(&mut self, call: &DrawCall<'_>) -> anyhow::Result<()>;

    /// Finish the frame.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn end_frame(&mut self) -> anyhow::Result<()>;
}

/// A [`Renderer`] that logs what it would draw.
#[derive(Debug, Default)]
pub struct LogRenderer {
    view_projection: Mat4,
    frames: u64,
    draws: usize,
    visible: usize,
    lights: usize,
}

impl LogRenderer {
    /// Frames completed so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draw calls in the current or last frame.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Draw calls whose origin landed inside the view frustum.
    #[must_use]
    pub fn visible(&self) -> usize {
        self.visible
    }
}

impl Renderer for LogRenderer {
    fn begin_frame(&mut self, uniforms: &FrameUniforms, lights: &[LightData]) -> anyhow::Result<()> {
        self.view_projection = uniforms.projection * uniforms.view;
        self.draws = 0;
        self.visible = 0;
        self.lights = lights.len();
        trace!(camera = ?uniforms.camera_position, lights = lights.len(), "begin frame");
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> anyhow::Result<()> {
        self.draws += 1;
        let clip = self.view_projection * call.model.w_axis;
        let inside = clip.w > 0.0 && clip.truncate().abs().cmple(Vec3::splat(clip.w)).all();
        if inside {
            self.visible += 1;
        }
        trace!(
            entity = %call.entity,
            mesh = %call.mesh.asset_path,
            shininess = call.material.shininess,
            inside,
            "draw"
        );
        Ok(())
    }

    fn end_frame(&mut self) -> anyhow::Result<()> {
        self.frames += 1;
        debug!(
            frame = self.frames,
            draws = self.draws,
            visible = self.visible,
            lights = self.lights,
            "frame rendered"
        );
        Ok(())
    }
}

/// Draws every (`Spatial`, `MeshRef`, `Material`) entity from the main camera.
pub struct RenderSystem<R> {
    renderer: R,
    aspect: Rc<Cell<f32>>,
    subscription: Option<Subscription>,
    skipped: u64,
}

impl<R: Renderer> RenderSystem<R> {
    /// Create a render system drawing through `renderer`.
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            aspect: Rc::new(Cell::new(1.0)),
            subscription: None,
            skipped: 0,
        }
    }

    /// The backend.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Aspect ratio used for the projection.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.aspect.get()
    }

    /// Frames skipped because there was no main camera.
    #[must_use]
    pub fn skipped_frames(&self) -> u64 {
        self.skipped
    }
}

impl<R: Renderer + 'static> System for RenderSystem<R> {
    fn name(&self) -> &'static str {
        "render"
    }

    fn init(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        self.aspect.set(ctx.window.aspect());
        let aspect = Rc::clone(&self.aspect);
        self.subscription = Some(ctx.bus.add_receiver(
            None,
            move |msg: &WindowFrameSizeMessage, _: &mut ComponentStore| {
                aspect.set(msg.aspect());
            },
        ));
        Ok(())
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        let store = &*ctx.store;

        let Some(camera) = store.get_component_tuple::<(Camera, Spatial, MainCamera)>() else {
            debug!("no main camera, skipping render");
            self.skipped += 1;
            return Ok(());
        };
        let eye = camera.get::<Spatial>();
        let lens = camera.get::<Camera>();
        let uniforms = FrameUniforms {
            view: lens.view(eye),
            projection: lens.projection(self.aspect.get()),
            camera_position: eye.position,
        };

        let lights: Vec<LightData> = store
            .get_component_tuples::<(Light, Spatial)>()
            .iter()
            .map(|t| LightData {
                position: t.get::<Spatial>().position,
                light: *t.get::<Light>(),
            })
            .collect();

        self.renderer.begin_frame(&uniforms, &lights)?;
        for tuple in store.get_component_tuples::<(Spatial, MeshRef, Material)>() {
            self.renderer.draw(&DrawCall {
                entity: tuple.entity(),
                model: tuple.get::<Spatial>().model_matrix(),
                mesh: tuple.get::<MeshRef>(),
                material: tuple.get::<Material>(),
            })?;
        }
        self.renderer.end_frame()
    }

    fn inspect(&self, store: &ComponentStore) -> Option<serde_json::Value> {
        Some(json!({
            "aspect": self.aspect.get(),
            "drawables": store.query_entities::<(Spatial, MeshRef, Material)>().len(),
            "skipped_frames": self.skipped,
        }))
    }

    fn shutdown(&mut self, ctx: &mut SystemContext<'_>) {
        if let Some(subscription) = self.subscription.take() {
            ctx.bus.remove_receiver(subscription);
        }
    }
}
