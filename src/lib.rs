//! # sierp - Sierpinski tetrahedron in orbit
//!
//! Renders a chaos-game approximation of a Sierpinski tetrahedron as a
//! point cloud. The cloud is pulled around by a moving attractor, tumbles
//! slowly, and pulses its colors, drawn with wgpu in a winit window.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sierp::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     Viewer::new()
//!         .with_point_count(50_000)
//!         .with_trails(true)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Generation
//!
//! [`sierpinski::generate`] runs the chaos game once at startup. The
//! resulting [`PointSet`] is uploaded to the GPU and never changes.
//!
//! ### Animation
//!
//! [`Animator::step`] turns the previous [`AnimationState`] and a frame
//! timestamp into the next state plus a [`FrameOutcome`]: either a
//! [`DrawCommand`] or a skipped frame when the gap since the last frame is
//! too long (e.g. the window was hidden). It has no side effects, so it can
//! be tested and benchmarked headless.
//!
//! ### Rendering
//!
//! [`FrameDriver`] feeds draw commands to any [`RenderBackend`]. The
//! bundled backend uses wgpu and keeps previous frames on screen so the
//! moving cloud leaves trails.

pub mod animation;
pub mod backend;
mod driver;
mod error;
mod gpu;
pub mod shader;
pub mod sierpinski;
pub mod time;
pub mod uniforms;
mod viewer;

pub use animation::{
    AnimationConfig, AnimationState, Animator, AttractorState, BodyState, FrameOutcome,
    PulseClock, SessionParams,
};
pub use backend::{CanvasSize, DrawCommand, RenderBackend};
pub use driver::FrameDriver;
pub use error::{GeneratorError, GpuError, ViewerError};
pub use glam::{Mat4, Vec2, Vec3};
pub use sierpinski::{ChaosGame, PointSet};
pub use uniforms::FrameUniforms;
pub use viewer::{StopHandle, Viewer, DEFAULT_POINT_COUNT};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use sierp::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::{AnimationConfig, Animator, FrameOutcome, SessionParams};
    pub use crate::backend::{CanvasSize, DrawCommand, RenderBackend};
    pub use crate::driver::FrameDriver;
    pub use crate::error::ViewerError;
    pub use crate::sierpinski::PointSet;
    pub use crate::time::FrameClock;
    pub use crate::viewer::{StopHandle, Viewer};
    pub use crate::{Mat4, Vec2, Vec3};
}
