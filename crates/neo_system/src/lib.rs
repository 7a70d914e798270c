//! # neo_system
//!
//! The "S" in ECS, plus the engine context that ties the crates together.
//!
//! This crate provides:
//!
//! - [`System`]: per-frame logic driven through a [`SystemContext`].
//! - [`SystemRegistry`]: ordered scheduling, lifecycle, and error policy.
//! - [`Engine`]: one store, one bus, one registry, and the frame loop.
//! - [`EngineConfig`]: JSON-loadable start-up configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neo_system::{Engine, EngineConfig, System, SystemContext};
//!
//! struct Hello;
//!
//! impl System for Hello {
//!     fn name(&self) -> &'static str {
//!         "hello"
//!     }
//!
//!     fn update(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
//!         tracing::info!(frame = ctx.frame.frame, "hello");
//!         Ok(())
//!     }
//! }
//!
//! let mut engine = Engine::new(EngineConfig::default().with_max_frames(10));
//! engine.add_system(Hello);
//! engine.run().unwrap();
//! engine.shutdown();
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod registry;
pub mod system;
pub mod timer;

pub use config::{EngineConfig, ErrorPolicy, WindowConfig};
pub use context::SystemContext;
pub use engine::Engine;
pub use error::{ConfigError, SystemError};
pub use registry::{EditorSnapshot, FrameReport, SystemId, SystemInspection, SystemRegistry, SystemState};
pub use system::{AsAny, System};
pub use timer::{FrameInfo, FrameTimer};
