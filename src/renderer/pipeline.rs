//! WebGPU render state: quad pipeline, offscreen target, post-process pass
//!
//! This is the thin I/O side of the renderer. All batching decisions happen
//! in [`super::batch::BatchRenderer`]; this module only uploads flushed
//! batches and issues the draw calls.

use wgpu::util::DeviceExt;

use crate::consts::{BATCH_SIZE, MAX_TEXTURE_SLOTS};

use super::batch::{DrawBackend, RenderTarget, ShaderId, SubmittedBatch};
use super::vertex::Vertex;

/// Post-process filter selection, uploaded as a uniform each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostFilter {
    #[default]
    None,
    Blur,
    Drunk,
    Chaos,
    Confuse,
}

impl PostFilter {
    fn id(self) -> u32 {
        match self {
            PostFilter::None => 0,
            PostFilter::Blur => 1,
            PostFilter::Drunk => 2,
            PostFilter::Chaos => 3,
            PostFilter::Confuse => 4,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PostUniforms {
    filter_id: u32,
    time: f32,
    texel: [f32; 2],
}

/// GPU-side vertex/index storage, allocated lazily on the first submit
struct GpuBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

struct OffscreenTarget {
    view: wgpu::TextureView,
}

struct FrameCtx {
    surface_texture: wgpu::SurfaceTexture,
    surface_view: wgpu::TextureView,
}

/// Main render state
pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    quad_pipeline: wgpu::RenderPipeline,
    quad_bind_layout: wgpu::BindGroupLayout,
    post_pipeline: wgpu::RenderPipeline,
    post_bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    buffers: Option<GpuBuffers>,
    /// Texture views indexed by `TextureId`; index 0 must be registered by
    /// the app but slot 0 always binds `blank` regardless
    textures: Vec<wgpu::TextureView>,
    blank: wgpu::TextureView,
    offscreen: OffscreenTarget,
    post_uniform: wgpu::Buffer,
    frame: Option<FrameCtx>,
    /// Viewport size in pixels
    pub size: (u32, u32),
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("brick-rush-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("post.wgsl").into()),
        });

        // One texture binding per slot plus the shared sampler
        let mut quad_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS as u32)
            .map(|i| wgpu::BindGroupLayoutEntry {
                binding: i,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        quad_entries.push(wgpu::BindGroupLayoutEntry {
            binding: MAX_TEXTURE_SLOTS as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let quad_bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad_bind_layout"),
            entries: &quad_entries,
        });

        let quad_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[&quad_bind_layout],
            immediate_size: 0,
        });

        let quad_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad_pipeline"),
            layout: Some(&quad_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                // Primitive restart: 0xFFFFFFFF separates quads in the strip
                strip_index_format: Some(wgpu::IndexFormat::Uint32),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let post_bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_bind_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let post_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_pipeline_layout"),
            bind_group_layouts: &[&post_bind_layout],
            immediate_size: 0,
        });

        let post_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("post_pipeline"),
            layout: Some(&post_layout),
            vertex: wgpu::VertexState {
                module: &post_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &post_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quad_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let blank = Self::make_blank_texture(&device, &queue);
        let offscreen = Self::make_offscreen(&device, &config);

        let post_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("post_uniforms"),
            contents: bytemuck::bytes_of(&PostUniforms {
                filter_id: 0,
                time: 0.0,
                texel: [1.0 / width as f32, 1.0 / height as f32],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            surface,
            device,
            queue,
            config,
            quad_pipeline,
            quad_bind_layout,
            post_pipeline,
            post_bind_layout,
            sampler,
            buffers: None,
            textures: Vec::new(),
            blank,
            offscreen,
            post_uniform,
            frame: None,
            size: (width, height),
        }
    }

    /// The single registered quad shader program
    pub fn quad_shader(&self) -> ShaderId {
        ShaderId(0)
    }

    fn make_blank_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("blank"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            Default::default(),
            &[255, 255, 255, 255],
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn make_offscreen(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> OffscreenTarget {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_target"),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        OffscreenTarget {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }

    /// Upload an RGBA8 texture; returns its index, which must match the
    /// `TextureId` minted by the texture library for the same asset.
    pub fn create_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) -> u32 {
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        self.upload_texture(width, height, wgpu::TextureFormat::Rgba8UnormSrgb, pixels)
    }

    /// Upload a single-channel texture (glyph atlas)
    pub fn create_texture_r8(&mut self, width: u32, height: u32, pixels: &[u8]) -> u32 {
        assert_eq!(pixels.len(), (width * height) as usize);
        self.upload_texture(width, height, wgpu::TextureFormat::R8Unorm, pixels)
    }

    fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        pixels: &[u8],
    ) -> u32 {
        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("game_texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            Default::default(),
            pixels,
        );
        self.textures
            .push(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.textures.len() as u32 - 1
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            // The offscreen target tracks the surface size
            self.offscreen = Self::make_offscreen(&self.device, &self.config);
        }
    }

    /// Acquire the frame's surface texture and clear both targets
    pub fn begin_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear_encoder"),
            });
        for view in [&self.offscreen.view, &surface_view] {
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        self.frame = Some(FrameCtx {
            surface_texture,
            surface_view,
        });
        Ok(())
    }

    /// Run the post-process pass (offscreen -> surface) and present
    pub fn present(&mut self, filter: PostFilter, time: f32) {
        let Some(frame) = self.frame.take() else {
            log::warn!("RenderState - present() without begin_frame()");
            return;
        };

        self.queue.write_buffer(
            &self.post_uniform,
            0,
            bytemuck::bytes_of(&PostUniforms {
                filter_id: filter.id(),
                time,
                texel: [1.0 / self.size.0 as f32, 1.0 / self.size.1 as f32],
            }),
        );

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post_bind_group"),
            layout: &self.post_bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.offscreen.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.post_uniform.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("post_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("post_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.post_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.surface_texture.present();
    }

    fn ensure_buffers(&mut self) {
        if self.buffers.is_some() {
            return;
        }
        // One-time allocation on the first flush
        let vertices = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("batch_vertices"),
            size: (BATCH_SIZE * 4 * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let indices = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("batch_indices"),
            size: (BATCH_SIZE * 5 * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.buffers = Some(GpuBuffers { vertices, indices });
        log::info!("RenderState - allocated batch buffers ({BATCH_SIZE} quads)");
    }
}

impl DrawBackend for RenderState {
    fn submit(&mut self, batch: SubmittedBatch<'_>) {
        debug_assert_eq!(batch.shader, ShaderId(0), "unknown shader program");
        if self.frame.is_none() {
            log::warn!("RenderState - submit outside begin_frame/present");
            return;
        }

        self.ensure_buffers();
        let frame = self.frame.as_ref().expect("frame checked above");
        let buffers = self.buffers.as_ref().expect("buffers just ensured");
        self.queue
            .write_buffer(&buffers.vertices, 0, bytemuck::cast_slice(batch.quads));
        self.queue
            .write_buffer(&buffers.indices, 0, bytemuck::cast_slice(batch.indices));

        // Bind every slot; unoccupied slots fall back to the blank texture
        let entries: Vec<wgpu::BindGroupEntry> = (0..MAX_TEXTURE_SLOTS)
            .map(|i| {
                let view = match batch.slots[i] {
                    Some(id) => self
                        .textures
                        .get(id.0 as usize)
                        .unwrap_or_else(|| panic!("unregistered texture {id:?}")),
                    None => &self.blank,
                };
                wgpu::BindGroupEntry {
                    binding: i as u32,
                    resource: wgpu::BindingResource::TextureView(view),
                }
            })
            .chain(std::iter::once(wgpu::BindGroupEntry {
                binding: MAX_TEXTURE_SLOTS as u32,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            }))
            .collect();
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad_bind_group"),
            layout: &self.quad_bind_layout,
            entries: &entries,
        });

        let target_view = match batch.target {
            RenderTarget::Surface => &frame.surface_view,
            RenderTarget::Offscreen => &self.offscreen.view,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("batch_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("batch_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.quad_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, buffers.vertices.slice(..));
            pass.set_index_buffer(buffers.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..(batch.indices.len() * 5) as u32, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
