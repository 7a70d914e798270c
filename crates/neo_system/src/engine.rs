//! The engine context.
//!
//! [`Engine`] owns one store, one bus, one system registry, and the frame
//! timer. Each frame runs the same sequence:
//!
//! 1. Advance the timer.
//! 2. Update every active system, in registration order.
//! 3. Run the editor inspection pass, if enabled.
//! 4. Flush the message bus.
//!
//! There is no global instance; several engines can live side by side.

use std::time::{Duration, Instant};

use neo_component::{ComponentStore, EcsError, Entity};
use neo_message::{MessageBus, WindowFrameSizeMessage};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::context::SystemContext;
use crate::error::SystemError;
use crate::registry::{EditorSnapshot, FrameReport, SystemId, SystemRegistry};
use crate::system::System;
use crate::timer::FrameTimer;

/// Store, bus, and systems for one running application.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: ComponentStore,
    bus: MessageBus,
    systems: SystemRegistry,
    timer: FrameTimer,
    editor: Option<EditorSnapshot>,
    stop_requested: bool,
}

impl Engine {
    /// Create an engine from its configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        info!(
            app = %config.app_name,
            width = config.window.width,
            height = config.window.height,
            component_policy = ?config.component_policy,
            error_policy = ?config.error_policy,
            "engine created"
        );
        Self {
            store: ComponentStore::with_policy(config.component_policy),
            bus: MessageBus::new(),
            systems: SystemRegistry::new(config.error_policy),
            timer: FrameTimer::new(),
            editor: None,
            stop_requested: false,
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a reference to the component store.
    #[must_use]
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Returns a mutable reference to the component store.
    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    /// Returns a reference to the message bus.
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Returns a mutable reference to the message bus.
    pub fn bus_mut(&mut self) -> &mut MessageBus {
        &mut self.bus
    }

    /// Returns a reference to the system registry.
    #[must_use]
    pub fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    /// Returns a mutable reference to the system registry.
    pub fn systems_mut(&mut self) -> &mut SystemRegistry {
        &mut self.systems
    }

    /// Frame timing so far.
    #[must_use]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// The most recent editor snapshot, if the editor pass is enabled.
    #[must_use]
    pub fn editor_snapshot(&self) -> Option<&EditorSnapshot> {
        self.editor.as_ref()
    }

    /// Register a system at the end of the execution order.
    pub fn add_system<S: System>(&mut self, system: S) -> SystemId {
        self.systems.add_system(system)
    }

    /// Initialize every registered system, then deliver anything they sent.
    ///
    /// # Errors
    ///
    /// Propagates [`SystemError::InitFailed`] under `ErrorPolicy::Halt`.
    pub fn init(&mut self) -> Result<usize, SystemError> {
        let mut ctx = SystemContext::new(
            &mut self.store,
            &mut self.bus,
            self.timer.info(),
            self.config.window,
        );
        let initialized = self.systems.init_all(&mut ctx)?;
        self.stop_requested |= ctx.stop_requested();
        self.bus.flush(&mut self.store);
        info!(systems = self.systems.len(), initialized, "engine initialized");
        Ok(initialized)
    }

    /// Run a single frame that took `dt` seconds.
    ///
    /// # Errors
    ///
    /// Under `ErrorPolicy::Halt` a failing system aborts the frame. Messages
    /// queued before the failure stay queued until the next flush.
    pub fn run_frame(&mut self, dt: f64) -> Result<FrameReport, SystemError> {
        let frame = self.timer.advance(dt);
        debug!(frame = frame.frame, dt, "frame start");

        let mut ctx = SystemContext::new(&mut self.store, &mut self.bus, frame, self.config.window);
        let result = self.systems.update_frame(&mut ctx);
        self.stop_requested |= ctx.stop_requested();
        let mut report = result?;

        if self.config.editor_enabled {
            self.editor = Some(self.systems.editor_pass(&self.store));
        }

        report.delivered = self.bus.flush(&mut self.store);
        debug!(
            frame = frame.frame,
            executed = report.executed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            delivered = report.delivered,
            "frame complete"
        );
        Ok(report)
    }

    /// Ask [`run`](Self::run) to return after the current frame.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Run frames until `max_frames` is reached or a stop is requested.
    ///
    /// Frames are paced to `target_fps` when it is non-zero. Returns the
    /// number of frames run by this call. A stop requested before the call
    /// ends it before the first frame. The request is consumed when `run`
    /// returns, so a later call starts a fresh loop.
    ///
    /// # Errors
    ///
    /// Propagates the first system failure under `ErrorPolicy::Halt`.
    pub fn run(&mut self) -> Result<u64, SystemError> {
        let result = self.frame_loop();
        self.stop_requested = false;
        result
    }

    fn frame_loop(&mut self) -> Result<u64, SystemError> {
        let budget = (self.config.target_fps > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / self.config.target_fps));
        let mut frames = 0u64;

        info!(
            target_fps = self.config.target_fps,
            max_frames = self.config.max_frames,
            "starting frame loop"
        );

        self.init()?;
        let mut last = Instant::now();

        while !self.stop_requested {
            let start = Instant::now();
            let dt = start.duration_since(last).as_secs_f64();
            last = start;

            self.run_frame(dt)?;
            frames += 1;

            if self.config.max_frames > 0 && frames >= self.config.max_frames {
                break;
            }

            let Some(budget) = budget else {
                continue;
            };
            let elapsed = start.elapsed();
            if elapsed < budget {
                std::thread::sleep(budget - elapsed);
            } else {
                warn!(
                    frame = self.timer.frame(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }

        info!(frames, fps = self.timer.info().fps, "frame loop complete");
        Ok(frames)
    }

    /// Change the framebuffer size and broadcast a [`WindowFrameSizeMessage`].
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.window.width = width;
        self.config.window.height = height;
        self.bus.send(WindowFrameSizeMessage { width, height });
        debug!(width, height, "window resized");
    }

    /// Destroy an entity, its components, and any receivers targeted at it.
    ///
    /// Returns the number of components removed.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] if the entity is not alive.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<usize, EcsError> {
        let removed = self.store.remove_entity(entity)?;
        self.bus.remove_receivers_for(entity);
        Ok(removed)
    }

    /// Shut every system down in reverse order and deliver their final messages.
    pub fn shutdown(&mut self) {
        let mut ctx = SystemContext::new(
            &mut self.store,
            &mut self.bus,
            self.timer.info(),
            self.config.window,
        );
        let calls = self.systems.shutdown_all(&mut ctx);
        self.bus.flush(&mut self.store);
        info!(
            app = %self.config.app_name,
            frames = self.timer.frame(),
            shutdown_calls = calls,
            "engine shut down"
        );
    }
}
