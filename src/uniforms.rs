//! Per-frame shader uniforms.
//!
//! [`FrameUniforms`] is what the animation produces each frame;
//! [`GpuUniforms`] is its std140-compatible byte layout. The two must stay
//! in sync with [`UNIFORMS_WGSL`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

/// WGSL declaration matching [`GpuUniforms`].
pub const UNIFORMS_WGSL: &str = r#"struct Uniforms {
    u_world: mat4x4<f32>,
    u_view: mat4x4<f32>,
    u_perspective: mat4x4<f32>,
    resolution: vec2<f32>,
    time: f32,
};"#;

/// Values handed to the point shader for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUniforms {
    /// Pulse value in roughly `[0, 1]`.
    pub time: f32,
    /// Canvas size in pixels.
    pub resolution: Vec2,
    pub world: Mat4,
    pub view: Mat4,
    pub perspective: Mat4,
}

impl FrameUniforms {
    pub fn to_gpu(&self) -> GpuUniforms {
        GpuUniforms {
            world: self.world.to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            perspective: self.perspective.to_cols_array_2d(),
            resolution: self.resolution.to_array(),
            time: self.time,
            _padding: 0.0,
        }
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            resolution: Vec2::ZERO,
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            perspective: Mat4::IDENTITY,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuUniforms {
    world: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    perspective: [[f32; 4]; 4],
    resolution: [f32; 2],
    time: f32,
    _padding: f32,
}
