//! The [`System`] trait.
//!
//! A system is a unit of per-frame logic. It owns whatever private state it
//! needs and reaches the world only through the [`SystemContext`] it is
//! handed. Systems never hold references into the store across calls; they
//! query afresh every frame.

use std::any::Any;

use neo_component::ComponentStore;

use crate::context::SystemContext;

/// Upcast to [`Any`] so the registry can hand back concrete system types.
pub trait AsAny: Any {
    /// `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-frame game or engine logic, driven by the
/// [`SystemRegistry`](crate::SystemRegistry).
///
/// ```
/// use neo_system::{System, SystemContext};
///
/// struct Counter(u64);
///
/// impl System for Counter {
///     fn name(&self) -> &'static str {
///         "counter"
///     }
///
///     fn update(&mut self, _ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait System: AsAny {
    /// Name used in logs, reports, and the editor snapshot.
    fn name(&self) -> &'static str;

    /// Called once before the first `update`.
    ///
    /// # Errors
    ///
    /// A failing `init` is handled according to the registry's
    /// [`ErrorPolicy`](crate::ErrorPolicy).
    fn init(&mut self, _ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per frame while the system is active.
    ///
    /// # Errors
    ///
    /// A failing `update` is handled according to the registry's
    /// [`ErrorPolicy`](crate::ErrorPolicy).
    fn update(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()>;

    /// Read-only summary for the editor pass.
    fn inspect(&self, _store: &ComponentStore) -> Option<serde_json::Value> {
        None
    }

    /// Called once when the registry shuts down.
    fn shutdown(&mut self, _ctx: &mut SystemContext<'_>) {}
}
