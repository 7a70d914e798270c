//! Frame timing.
//!
//! [`FrameTimer`] is fed the delta of each frame and derives the frame
//! counter, total elapsed time, and a frames-per-second estimate refreshed
//! once per second of accumulated time.

use serde::Serialize;

/// Snapshot of the timer handed to systems each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameInfo {
    /// 1-based index of the current frame (0 before the first frame).
    pub frame: u64,
    /// Seconds since the previous frame.
    pub dt: f64,
    /// Seconds accumulated since the first frame.
    pub elapsed: f64,
    /// Frames per second over the last full measurement window.
    pub fps: f64,
}

/// Accumulates per-frame timing.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    info: FrameInfo,
    window_frames: u32,
    window_time: f64,
}

impl FrameTimer {
    /// Length of one FPS measurement window, in seconds.
    pub const FPS_WINDOW: f64 = 1.0;

    /// Create a timer at frame zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame that took `dt` seconds since the last one.
    pub fn advance(&mut self, dt: f64) -> FrameInfo {
        let dt = dt.max(0.0);
        self.info.frame += 1;
        self.info.dt = dt;
        self.info.elapsed += dt;

        self.window_frames += 1;
        self.window_time += dt;
        if self.window_time >= Self::FPS_WINDOW {
            self.info.fps = f64::from(self.window_frames) / self.window_time;
            self.window_frames = 0;
            self.window_time = 0.0;
        }
        self.info
    }

    /// The current snapshot.
    #[must_use]
    pub fn info(&self) -> FrameInfo {
        self.info
    }

    /// Frames started so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.info.frame
    }
}
