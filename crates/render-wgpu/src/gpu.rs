use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cylgrid_render::{
    AttributeFormat, DepthCompare, DrawCall, GraphicsDevice, InstanceRecord, InstanceStorage,
    RenderError, RenderResult, RenderState, ShaderSource, UpdateFrequency, VertexSchema,
};
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::shaders::{FRAGMENT_ENTRY, VERTEX_ENTRY};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// wgpu attributes for `schema`, numbering shader locations from
/// `first_location`. A 4x4 matrix occupies four consecutive vec4 locations.
pub fn vertex_attributes(schema: &VertexSchema, first_location: u32) -> Vec<wgpu::VertexAttribute> {
    let mut location = first_location;
    let mut out = Vec::new();
    for (attr, offset) in schema.offsets() {
        match attr.format {
            AttributeFormat::Float3 => {
                out.push(wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset,
                    shader_location: location,
                });
            }
            AttributeFormat::Float4x4 => {
                for row in 0..4 {
                    out.push(wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x4,
                        offset: offset + row * 16,
                        shader_location: location + row as u32,
                    });
                }
            }
        }
        location += attr.format.locations();
    }
    out
}

fn step_mode(frequency: UpdateFrequency) -> wgpu::VertexStepMode {
    match frequency {
        UpdateFrequency::Static => wgpu::VertexStepMode::Vertex,
        UpdateFrequency::PerInstance => wgpu::VertexStepMode::Instance,
    }
}

fn compare_function(compare: DepthCompare) -> wgpu::CompareFunction {
    match compare {
        DepthCompare::Never => wgpu::CompareFunction::Never,
        DepthCompare::Less => wgpu::CompareFunction::Less,
        DepthCompare::Equal => wgpu::CompareFunction::Equal,
        DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthCompare::Greater => wgpu::CompareFunction::Greater,
        DepthCompare::NotEqual => wgpu::CompareFunction::NotEqual,
        DepthCompare::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        DepthCompare::Always => wgpu::CompareFunction::Always,
    }
}

/// Per-instance vertex buffer with a CPU staging copy. Writes go to the
/// staging copy while mapped; `unmap` uploads it in one queue write.
pub struct WgpuInstances {
    buffer: wgpu::Buffer,
    staging: Vec<InstanceRecord>,
    mapped: bool,
    queue: Arc<wgpu::Queue>,
}

impl InstanceStorage for WgpuInstances {
    fn capacity(&self) -> usize {
        self.staging.len()
    }

    fn map(&mut self) -> RenderResult<()> {
        if self.mapped {
            return Err(RenderError::BufferMap("instance buffer already mapped".into()));
        }
        self.mapped = true;
        Ok(())
    }

    fn mapped(&self) -> &[InstanceRecord] {
        if self.mapped { &self.staging } else { &[] }
    }

    fn mapped_mut(&mut self) -> &mut [InstanceRecord] {
        if self.mapped { &mut self.staging } else { &mut [] }
    }

    fn unmap(&mut self) {
        if !self.mapped {
            return;
        }
        self.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.staging));
        self.mapped = false;
    }

    fn is_mapped(&self) -> bool {
        self.mapped
    }
}

pub struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
}

/// Owns the surface, the device and the depth target.
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    adapter_info: wgpu::AdapterInfo,
    lost: Arc<AtomicBool>,
}

impl WgpuDevice {
    /// Pick an adapter for `surface`, open a device and configure the
    /// surface at `width × height`.
    pub fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::Surface("no compatible graphics adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cylgrid_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Surface(format!("failed to create device: {e}")))?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            tracing::error!(?reason, "device lost: {message}");
            flag.store(true, Ordering::Release);
        });

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        let adapter_info = adapter.get_info();
        tracing::info!(
            backend = adapter_info.backend.to_str(),
            adapter = %adapter_info.name,
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue: Arc::new(queue),
            config,
            depth_view,
            adapter_info,
            lost,
        })
    }

    /// Reconfigure the surface and depth target for a new window size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    fn shader_module(&self, label: &str, source: &str) -> RenderResult<wgpu::ShaderModule> {
        if source.trim().is_empty() {
            return Err(RenderError::ShaderCompilation(format!("{label}: empty source")));
        }
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::ShaderCompilation(format!("{label}: {err}"))),
            None => Ok(module),
        }
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

impl GraphicsDevice for WgpuDevice {
    type VertexBuffer = wgpu::Buffer;
    type IndexBuffer = wgpu::Buffer;
    type InstanceBuffer = WgpuInstances;
    type Program = WgpuProgram;

    fn create_vertex_buffer(
        &mut self,
        positions: &[Vec3],
        schema: &VertexSchema,
    ) -> RenderResult<wgpu::Buffer> {
        debug_assert_eq!(schema.stride(), std::mem::size_of::<Vec3>() as u64);
        if positions.is_empty() {
            return Err(RenderError::BufferCreation("empty vertex buffer".into()));
        }
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cylinder_vertex_buffer"),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            }))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> RenderResult<wgpu::Buffer> {
        if indices.is_empty() {
            return Err(RenderError::BufferCreation("empty index buffer".into()));
        }
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cylinder_index_buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            }))
    }

    fn create_instance_buffer(
        &mut self,
        capacity: usize,
        schema: &VertexSchema,
    ) -> RenderResult<WgpuInstances> {
        let size = (capacity as u64)
            .checked_mul(schema.stride())
            .filter(|&s| s > 0 && s <= self.device.limits().max_buffer_size)
            .ok_or_else(|| {
                RenderError::BufferCreation(format!(
                    "instance buffer of {capacity} x {} bytes is out of range",
                    schema.stride()
                ))
            })?;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(WgpuInstances {
            buffer,
            staging: vec![InstanceRecord::default(); capacity],
            mapped: false,
            queue: Arc::clone(&self.queue),
        })
    }

    fn create_program(
        &mut self,
        shaders: &ShaderSource,
        layouts: [&VertexSchema; 2],
        state: RenderState,
    ) -> RenderResult<WgpuProgram> {
        let vs = self.shader_module("cylinder_vs", &shaders.vertex)?;
        let fs = self.shader_module("cylinder_fs", &shaders.fragment)?;

        let [mesh, instances] = layouts;
        let mesh_attrs = vertex_attributes(mesh, 0);
        let instance_attrs = vertex_attributes(instances, mesh.location_count());

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("cylinder_pipeline_layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        // The pass always carries a depth attachment, so a disabled test
        // still needs a matching (pass-through) depth state.
        let depth_stencil = Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: state.depth_test,
            depth_compare: if state.depth_test {
                compare_function(state.depth_compare)
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: Default::default(),
            bias: Default::default(),
        });

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("cylinder_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vs,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: mesh.stride(),
                            step_mode: step_mode(mesh.frequency),
                            attributes: &mesh_attrs,
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: instances.stride(),
                            step_mode: step_mode(instances.frequency),
                            attributes: &instance_attrs,
                        },
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fs,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilation(format!("pipeline link: {err}")));
        }

        Ok(WgpuProgram { pipeline })
    }

    fn submit(&mut self, draw: &DrawCall<'_, Self>) -> RenderResult<()> {
        if self.lost.load(Ordering::Acquire) {
            return Err(RenderError::DeviceLost);
        }
        if draw.instances.is_mapped() {
            return Err(RenderError::BufferMapped);
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out, skipping frame");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let color = draw.clear.color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cylinder_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(draw.clear.depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&draw.program.pipeline);
            pass.set_vertex_buffer(0, draw.vertices.slice(..));
            pass.set_vertex_buffer(1, draw.instances.buffer.slice(..));
            pass.set_index_buffer(draw.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..draw.index_count, 0, 0..draw.instance_count);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
