//! WGSL programs.
//!
//! The point program transforms each vertex by world, view and projection
//! and tints it by its local position, blended by the pulse value. The
//! present program copies the accumulation texture to the screen.

use crate::uniforms::UNIFORMS_WGSL;

/// Body of the point program; prefixed with [`UNIFORMS_WGSL`].
const POINT_BODY: &str = r#"
@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    let world_pos = uniforms.u_world * vec4<f32>(position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.u_perspective * uniforms.u_view * world_pos;

    // Map the tetrahedron's bounding box to [0, 1].
    let base = clamp(position + vec3<f32>(0.5, 0.0, 0.5), vec3<f32>(0.0), vec3<f32>(1.0));
    out.color = mix(base, vec3<f32>(1.0) - base.zxy, vec3<f32>(uniforms.time));
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

/// Full source of the point program.
pub fn point_shader() -> String {
    format!("{}\n{}", UNIFORMS_WGSL, POINT_BODY)
}

/// Fullscreen pass sampling the persistent accumulation texture.
pub const PRESENT_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var scene: texture_2d<f32>;
@group(0) @binding(1)
var scene_sampler: sampler;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(scene, scene_sampler, in.uv);
}
"#;
