//! wgpu rendering backend.

mod accumulation;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::backend::{CanvasSize, DrawCommand, RenderBackend};
use crate::error::GpuError;
use crate::shader::point_shader;
use crate::sierpinski::{PointSet, MAX_POINT_COUNT};
use crate::uniforms::{FrameUniforms, GpuUniforms};
use accumulation::AccumulationTarget;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;
const POINT_STRIDE: u64 = std::mem::size_of::<[f32; 3]>() as u64;

/// Most points whose vertex buffer fits within `limits`.
pub fn max_point_count(limits: &wgpu::Limits) -> usize {
    let by_buffer = usize::try_from(limits.max_buffer_size / POINT_STRIDE).unwrap_or(usize::MAX);
    by_buffer.min(MAX_POINT_COUNT)
}

/// Fails when `point_count` would not fit in one vertex buffer.
pub fn check_point_count(point_count: usize, limits: &wgpu::Limits) -> Result<(), GpuError> {
    let max_points = max_point_count(limits);
    if point_count > max_points {
        return Err(GpuError::PointBufferTooLarge {
            points: point_count,
            max_points,
        });
    }
    Ok(())
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    point_pipeline: wgpu::RenderPipeline,
    point_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    // Present when trails are enabled
    accumulation: Option<AccumulationTarget>,
    needs_clear: bool,
}

impl GpuState {
    /// Set up the device, compile the point program and upload `points`.
    pub async fn new(window: Arc<Window>, points: &PointSet, trails: bool) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        check_point_count(points.len(), &device.limits())?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let point_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Buffer"),
            contents: points.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniforms = FrameUniforms::default().to_gpu();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let point_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(point_shader().into()),
        });

        let point_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Point Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let point_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Pipeline"),
            layout: Some(&point_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &point_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: POINT_STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3, // position
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &point_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let accumulation = trails
            .then(|| AccumulationTarget::new(&device, config.width, config.height, config.format));

        log::info!(
            "Uploaded {} points ({} bytes), trails {}",
            points.len(),
            points.as_bytes().len(),
            if trails { "on" } else { "off" }
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            point_pipeline,
            point_buffer,
            uniform_buffer,
            uniform_bind_group,
            depth_texture,
            accumulation,
            needs_clear: true,
        })
    }

    /// Reconfigure the surface at its current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        self.resize(self.canvas_size());
    }
}

impl RenderBackend for GpuState {
    type Error = wgpu::SurfaceError;

    fn canvas_size(&self) -> CanvasSize {
        CanvasSize::new(self.config.width, self.config.height)
    }

    fn resize(&mut self, size: CanvasSize) {
        if size.is_empty() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = create_depth_texture(&self.device, &self.config);
        if let Some(accumulation) = &mut self.accumulation {
            accumulation.resize(&self.device, size.width, size.height);
        }
        self.clear();
        log::debug!("Resized to {}x{}", size.width, size.height);
    }

    /// Takes effect with the next draw.
    fn clear(&mut self) {
        self.needs_clear = true;
    }

    fn draw(&mut self, command: &DrawCommand) -> Result<(), wgpu::SurfaceError> {
        let uniforms: GpuUniforms = command.uniforms.to_gpu();
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Without trails every frame starts from a clean slate.
        let (color_view, depth_view, keep) = match &self.accumulation {
            Some(acc) => (&acc.view, &acc.depth_view, !self.needs_clear),
            None => (&surface_view, &self.depth_texture, false),
        };

        let (color_load, depth_load) = if keep {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        } else {
            (wgpu::LoadOp::Clear(CLEAR_COLOR), wgpu::LoadOp::Clear(1.0))
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.point_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.point_buffer.slice(..));
            render_pass.draw(0..command.vertex_count, 0..1);
        }

        if let Some(acc) = &self.accumulation {
            acc.present(&mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.needs_clear = false;

        Ok(())
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_point_count_follows_buffer_limit() {
        let limits = wgpu::Limits {
            max_buffer_size: 1200,
            ..Default::default()
        };
        assert_eq!(max_point_count(&limits), 100);
        assert!(check_point_count(100, &limits).is_ok());
        assert!(matches!(
            check_point_count(101, &limits),
            Err(GpuError::PointBufferTooLarge {
                points: 101,
                max_points: 100
            })
        ));
    }

    #[test]
    fn test_max_point_count_is_capped_by_vertex_index() {
        let limits = wgpu::Limits {
            max_buffer_size: u64::MAX,
            ..Default::default()
        };
        assert!(max_point_count(&limits) <= MAX_POINT_COUNT);
    }

    #[test]
    fn test_default_limits_accept_default_point_count() {
        let limits = wgpu::Limits::default();
        assert!(check_point_count(crate::viewer::DEFAULT_POINT_COUNT, &limits).is_ok());
        assert!(check_point_count(usize::MAX, &limits).is_err());
    }
}
