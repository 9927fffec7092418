//! Frame timestamps.
//!
//! [`FrameClock`] plays the role of the display scheduler's clock: every
//! tick returns a monotonic timestamp in milliseconds since the clock was
//! created, and the frame rate is recomputed periodically.
//!
//! # Example
//!
//! ```ignore
//! use sierp::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // Once per redraw:
//! let tick = clock.tick();
//! if let Some(fps) = tick.fps {
//!     log::info!("FPS: {:.1}", fps);
//! }
//! ```

use std::time::{Duration, Instant};

/// Result of one [`FrameClock::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Milliseconds since the clock started.
    pub timestamp_ms: f64,
    /// Freshly computed frame rate, when the update interval elapsed.
    pub fps: Option<f32>,
}

/// Monotonic millisecond clock with FPS bookkeeping.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created.
    start: Instant,
    /// Total ticks since start.
    frame_count: u64,
    /// Last computed FPS.
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
}

impl FrameClock {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_secs(5),
        }
    }

    /// Change how often the frame rate is recomputed.
    pub fn with_fps_interval(mut self, interval: Duration) -> Self {
        self.fps_update_interval = interval;
        self
    }

    /// Milliseconds since start, without counting a frame.
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Count a frame and return its timestamp.
    pub fn tick(&mut self) -> Tick {
        let now = Instant::now();
        let timestamp_ms = now.duration_since(self.start).as_secs_f64() * 1000.0;
        self.frame_count += 1;

        let mut fps = None;
        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            fps = Some(self.fps);
        }

        Tick { timestamp_ms, fps }
    }

    /// Total ticks since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Last computed frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
