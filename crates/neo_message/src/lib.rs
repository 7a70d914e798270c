//! # neo_message
//!
//! Decoupled notifications between systems and components.
//!
//! This crate provides:
//!
//! - [`Message`]: the marker trait for message payloads.
//! - [`MessageBus`]: typed, entity-targetable, batched delivery.
//! - [`Subscription`]: the handle used to unregister a receiver.
//! - [`messages`]: the message types the engine itself sends.

pub mod bus;
pub mod messages;

pub use bus::{MessageBus, Subscription};
pub use messages::{Message, SpatialChangeMessage, WindowFrameSizeMessage};
