//! Message trait and the message types the engine itself sends.
//!
//! Messages are plain data. The bus routes them by Rust type and optional
//! target entity; it never looks inside the payload.

use neo_component::Entity;

/// Marker trait for values that can travel over the [`MessageBus`](crate::MessageBus).
pub trait Message: std::fmt::Debug + 'static {
    /// A human-readable name, used in logs.
    fn message_name() -> &'static str;
}

// ── Window ──────────────────────────────────────────────────────────────────

/// The framebuffer was resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFrameSizeMessage {
    /// New width in pixels.
    pub width: u32,
    /// New height in pixels.
    pub height: u32,
}

impl WindowFrameSizeMessage {
    /// Width over height, or `1.0` for a degenerate frame.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl Message for WindowFrameSizeMessage {
    fn message_name() -> &'static str {
        "WindowFrameSize"
    }
}

// ── Spatial ─────────────────────────────────────────────────────────────────

/// An entity's spatial component changed. Usually sent with the moved entity
/// as target, so receivers can listen to just the entities they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialChangeMessage {
    /// The entity that moved.
    pub entity: Entity,
}

impl Message for SpatialChangeMessage {
    fn message_name() -> &'static str {
        "SpatialChange"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect() {
        let msg = WindowFrameSizeMessage {
            width: 800,
            height: 600,
        };
        assert!((msg.aspect() - 800.0 / 600.0).abs() < f32::EPSILON);

        let degenerate = WindowFrameSizeMessage {
            width: 800,
            height: 0,
        };
        assert_eq!(degenerate.aspect(), 1.0);
    }
}
