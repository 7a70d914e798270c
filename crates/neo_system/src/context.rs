//! Per-frame execution context provided to systems.

use neo_component::{ComponentStore, EcsError, Entity};
use neo_message::MessageBus;

use crate::config::WindowConfig;
use crate::timer::FrameInfo;

/// Context provided to a system on `init`, `update`, and `shutdown`.
///
/// Borrows the store and the bus mutably for the duration of one call, so a
/// system can query, mutate, and queue messages. Queued messages are
/// delivered after every system has run.
#[derive(Debug)]
pub struct SystemContext<'a> {
    /// The component store.
    pub store: &'a mut ComponentStore,
    /// The message bus.
    pub bus: &'a mut MessageBus,
    /// Timing for the current frame.
    pub frame: FrameInfo,
    /// Current framebuffer size.
    pub window: WindowConfig,
    stop_requested: bool,
}

impl<'a> SystemContext<'a> {
    /// Create a context for one frame.
    #[must_use]
    pub fn new(
        store: &'a mut ComponentStore,
        bus: &'a mut MessageBus,
        frame: FrameInfo,
        window: WindowConfig,
    ) -> Self {
        Self {
            store,
            bus,
            frame,
            window,
            stop_requested: false,
        }
    }

    /// Seconds since the previous frame.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.frame.dt
    }

    /// Remove `entity` from the store and drop the bus receivers targeted at
    /// it. Returns the number of component instances removed.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not alive.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<usize, EcsError> {
        let removed = self.store.remove_entity(entity)?;
        self.bus.remove_receivers_for(entity);
        Ok(removed)
    }

    /// Ask the engine loop to stop after the current frame.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Whether any system asked to stop during this context's lifetime.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let frame = FrameInfo {
            frame: 3,
            dt: 0.016,
            ..FrameInfo::default()
        };
        let mut ctx = SystemContext::new(&mut store, &mut bus, frame, WindowConfig::default());
        assert_eq!(ctx.frame.frame, 3);
        assert!((ctx.dt() - 0.016).abs() < f64::EPSILON);
        assert!(!ctx.stop_requested());

        ctx.store.create_entity();
        ctx.request_stop();
        assert!(ctx.stop_requested());
        assert_eq!(store.entity_count(), 1);
    }

    #[test]
    fn test_remove_entity_drops_its_receivers() {
        use neo_message::SpatialChangeMessage;

        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let e = store.create_entity();
        let _targeted = bus.add_receiver(Some(e), |_: &SpatialChangeMessage, _: &mut ComponentStore| {});
        let _broadcast = bus.add_receiver(None, |_: &SpatialChangeMessage, _: &mut ComponentStore| {});

        let mut ctx = SystemContext::new(&mut store, &mut bus, FrameInfo::default(), WindowConfig::default());
        assert_eq!(ctx.remove_entity(e).unwrap(), 0);
        assert_eq!(ctx.remove_entity(e), Err(EcsError::EntityNotFound(e)));

        assert!(!store.is_alive(e));
        assert_eq!(bus.receiver_count::<SpatialChangeMessage>(), 1);
    }
}
