//! Frame driver: runs one animation step against a rendering backend.

use crate::animation::{AnimationState, Animator, FrameOutcome};
use crate::backend::RenderBackend;

/// Owns the animation state and feeds draws to a backend.
///
/// The driver never schedules frames itself; the host loop calls
/// [`FrameDriver::frame`] once per display refresh.
pub struct FrameDriver {
    animator: Animator,
    state: AnimationState,
    frames_drawn: u64,
}

impl FrameDriver {
    pub fn new(animator: Animator) -> Self {
        let state = animator.initial_state();
        Self {
            animator,
            state,
            frames_drawn: 0,
        }
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Frames whose draw the backend accepted.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Advance to `timestamp_ms` and submit at most one draw.
    ///
    /// The canvas size is queried from the backend on every call.
    pub fn frame<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        timestamp_ms: f64,
    ) -> Result<FrameOutcome, B::Error> {
        let canvas = backend.canvas_size();
        let (next, outcome) = self.animator.step(&self.state, timestamp_ms, canvas);
        self.state = next;

        match &outcome {
            FrameOutcome::Stalled { dt_ms } => {
                log::debug!("Skipping stalled frame (dt = {:.1} ms)", dt_ms);
            }
            FrameOutcome::Draw(command) => {
                backend.draw(command)?;
                self.frames_drawn += 1;
            }
        }

        Ok(outcome)
    }
}
