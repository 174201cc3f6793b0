//! wgpu implementation of the stimulus graphics capability.
//!
//! Renders into an off-screen colour + depth target sized to the screen. The
//! finished texture is exposed through [`WgpuBackend::target_texture`] for the
//! distortion compositor to sample.
//!
//! Each draw is submitted on its own: shapes share nothing but the MVP
//! uniform, and both it and the one-texel colour are rewritten per draw, so
//! queue writes must land between submissions to keep draws independent.

use std::sync::{Arc, Mutex};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::info;
use wgpu::util::DeviceExt;

use crate::error::BackendError;
use crate::gpu::{AttributeSlots, GraphicsBackend, TextureId, Viewport};
use crate::mesh::{Mesh, Topology};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

const SLOTS: AttributeSlots = AttributeSlots { position: 0, uv: 1 };

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct StimulusUniforms {
    mvp: [[f32; 4]; 4],
}

pub struct WgpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

pub struct WgpuGeometry {
    positions: wgpu::Buffer,
    uvs: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct RenderTarget {
    id: TextureId,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    list_pipeline: wgpu::RenderPipeline,
    strip_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    target: Option<RenderTarget>,
    next_target_id: u64,
    viewport: Viewport,

    errors: Arc<Mutex<Option<String>>>,
}

impl WgpuBackend {
    /// Headless backend on the default adapter.
    pub async fn new() -> Result<Self, BackendError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(BackendError::NoAdapter)?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Stimulus Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;
        info!("GPU adapter: {}", adapter.get_info().name);
        Ok(Self::from_device(device, queue))
    }

    /// Blocking variant of [`WgpuBackend::new`] for hosts without an executor.
    pub fn new_blocking() -> Result<Self, BackendError> {
        pollster::block_on(Self::new())
    }

    /// Builds on a device the host already owns.
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let errors = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&errors);
        device.on_uncaptured_error(Box::new(move |error: wgpu::Error| {
            if let Ok(mut slot) = sink.lock() {
                slot.get_or_insert_with(|| error.to_string());
            }
        }));

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Stimulus Uniforms"),
            size: std::mem::size_of::<StimulusUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Stimulus Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Stimulus Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Stimulus Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Stimulus Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Stimulus Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/stimulus.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Stimulus Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let list_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let strip_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            wgpu::PrimitiveTopology::TriangleStrip,
        );

        Self {
            device,
            queue,
            list_pipeline,
            strip_pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            sampler,
            target: None,
            next_target_id: 1,
            viewport: Viewport::default(),
            errors,
        }
    }

    /// Colour texture holding the side-by-side image, once allocated.
    pub fn target_texture(&self) -> Option<&wgpu::Texture> {
        self.target.as_ref().map(|t| &t.color)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn record_error(&self, message: &str) {
        if let Ok(mut slot) = self.errors.lock() {
            slot.get_or_insert_with(|| message.to_string());
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let position_attributes = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: SLOTS.position,
    }];
    let uv_attributes = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: SLOTS.uv,
    }];
    let buffers = [
        wgpu::VertexBufferLayout {
            array_stride: 3 * std::mem::size_of::<f32>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &position_attributes,
        },
        wgpu::VertexBufferLayout {
            array_stride: 2 * std::mem::size_of::<f32>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &uv_attributes,
        },
    ];
    let strip_index_format = match topology {
        wgpu::PrimitiveTopology::TriangleStrip => Some(wgpu::IndexFormat::Uint16),
        _ => None,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Stimulus Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format,
            ..Default::default()
        },
        // The background sits on the far plane; it must pass against the
        // cleared depth.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl GraphicsBackend for WgpuBackend {
    type Texture = WgpuTexture;
    type Geometry = WgpuGeometry;

    fn attribute_slots(&self) -> AttributeSlots {
        SLOTS
    }

    fn create_texture(&mut self) -> WgpuTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Stimulus Texel"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Stimulus Texel Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        WgpuTexture { texture, bind_group }
    }

    fn write_texel(&mut self, texture: &WgpuTexture, rgb: [u8; 3]) {
        let [r, g, b] = rgb;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[r, g, b, 255],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    fn upload_mesh(&mut self, mesh: &Mesh, _slots: AttributeSlots) -> WgpuGeometry {
        // No fans in wgpu: fans become lists.
        let indices = mesh.list_indices();
        let positions = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Stimulus Positions"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uvs = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Stimulus UVs"),
            contents: bytemuck::cast_slice(&mesh.uv),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Stimulus Indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        WgpuGeometry {
            positions,
            uvs,
            indices: index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn allocate_target(&mut self, width: u32, height: u32) -> TextureId {
        // Old target goes first; never two screen-sized targets alive.
        self.target = None;

        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Stereo Color Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Stereo Depth Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let id = TextureId(self.next_target_id);
        self.next_target_id += 1;
        self.target = Some(RenderTarget {
            id,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
        });
        self.viewport = Viewport::full(size.width, size.height);
        info!("Render target {:?} allocated at {}x{}", id, size.width, size.height);
        id
    }

    fn begin_frame(&mut self, clear_color: [f64; 4]) {
        let Some(target) = &self.target else {
            self.record_error("begin_frame without a render target");
            return;
        };
        let [r, g, b, a] = clear_color;
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Clear Encoder"),
        });
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_mvp(&mut self, mvp: &[f32; 16]) {
        let uniforms = StimulusUniforms {
            mvp: Mat4::from_cols_array(mvp).to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn draw_indexed(&mut self, geometry: &WgpuGeometry, texture: &WgpuTexture, topology: Topology) {
        let Some(target) = &self.target else {
            self.record_error("draw without a render target");
            return;
        };
        let pipeline = match topology {
            Topology::Strip => &self.strip_pipeline,
            Topology::Fan | Topology::Triangles => &self.list_pipeline,
        };
        let vp = self.viewport;

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Stimulus Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stimulus Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_viewport(
                vp.x as f32,
                vp.y as f32,
                vp.width as f32,
                vp.height as f32,
                0.0,
                1.0,
            );
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            render_pass.set_vertex_buffer(0, geometry.positions.slice(..));
            render_pass.set_vertex_buffer(1, geometry.uvs.slice(..));
            render_pass.set_index_buffer(geometry.indices.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        log::trace!("Drew {} indices into target {:?}", geometry.index_count, target.id);
    }

    fn take_error(&mut self) -> Option<String> {
        self.errors.lock().ok().and_then(|mut slot| slot.take())
    }
}
