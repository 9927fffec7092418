//! Rendering backend capability surface.
//!
//! The frame driver only talks to the renderer through [`RenderBackend`],
//! so the animation can be exercised headless with a recording backend.

use glam::Vec2;

use crate::uniforms::FrameUniforms;

/// Canvas size in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. A zero height is treated as one pixel.
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Size as a float vector, as fed to the `resolution` uniform.
    #[inline]
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Whether either dimension is zero (minimized window).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for CanvasSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// One draw submission: the static point buffer rendered as point
/// primitives with the given uniforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub uniforms: FrameUniforms,
    pub vertex_count: u32,
}

/// What a renderer must provide to the frame driver.
///
/// Program compilation and point buffer upload happen when the backend is
/// constructed; after that the driver only reads the canvas size and
/// submits draws.
pub trait RenderBackend {
    type Error;

    /// Current canvas size. Read every frame, never cached by the driver.
    fn canvas_size(&self) -> CanvasSize;

    /// Follow a new canvas size. Implementations clear the canvas.
    fn resize(&mut self, size: CanvasSize);

    /// Clear color and depth.
    fn clear(&mut self);

    /// Bind the point buffer, upload uniforms and draw.
    fn draw(&mut self, command: &DrawCommand) -> Result<(), Self::Error>;
}
