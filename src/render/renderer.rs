use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::commands::{plan_passes, DrawMesh, Frame, FrameError, ModelId, Target};
use super::shader::{ShaderId, ShaderSource, ShaderUniforms};
use super::target::{FramebufferError, OffscreenTarget, COLOR_FORMAT, DEPTH_STENCIL_FORMAT};
use crate::model::{MeshData, VERTEX_STRIDE};

/// Upper bound on lamp draws per frame.
const MAX_DRAWS: usize = 16;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const SCREEN_QUAD: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 1.0] },
];

/// Assets the renderer uploads at startup.
pub struct SceneAssets {
    pub lamp_shader: ShaderSource,
    pub screen_shader: ShaderSource,
    pub primary_model: MeshData,
    pub light_model: MeshData,
}

/// wgpu renderer executing [`Frame`] command lists.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    offscreen: OffscreenTarget,
    lamp_offscreen_pipeline: wgpu::RenderPipeline,
    lamp_surface_pipeline: wgpu::RenderPipeline,
    screen_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_stride: u64,
    lamp_bind_group: wgpu::BindGroup,
    screen_bind_group: wgpu::BindGroup,
    screen_quad: wgpu::Buffer,
    primary: MeshBuffers,
    light: MeshBuffers,
    uniforms: ShaderUniforms,
}

impl Renderer {
    /// Initializes the GPU context for `window` and uploads `assets`.
    pub async fn new(window: Arc<Window>, assets: SceneAssets) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("renderer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: Default::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats)
            .context("surface reports no supported formats")?;

        // Fifo blocks on vertical sync when presenting.
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let offscreen = OffscreenTarget::create(&device, size.width, size.height);

        let lamp_vertex = shader_module(&device, "lamp-vertex", &assets.lamp_shader.vertex);
        let lamp_fragment = shader_module(&device, "lamp-fragment", &assets.lamp_shader.fragment);
        let screen_vertex = shader_module(&device, "screen-vertex", &assets.screen_shader.vertex);
        let screen_fragment =
            shader_module(&device, "screen-fragment", &assets.screen_shader.fragment);

        let uniforms = ShaderUniforms::new();
        let block_size = uniforms.get(ShaderId::Lamp).byte_len() as u64;
        let uniform_stride = align_to(
            block_size,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lamp-uniforms"),
            size: uniform_stride * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let block_binding_size =
            NonZeroU64::new(block_size).context("lamp uniform block is empty")?;

        let lamp_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lamp-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(block_binding_size),
                },
                count: None,
            }],
        });
        let lamp_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lamp-bind-group"),
            layout: &lamp_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: Some(block_binding_size),
                }),
            }],
        });

        let screen_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("screen-bind-layout"),
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
            ],
        });
        let screen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("screen-bind-group"),
            layout: &screen_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&offscreen.color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&offscreen.sampler),
                },
            ],
        });

        let lamp_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lamp-pipeline-layout"),
            bind_group_layouts: &[&lamp_layout],
            push_constant_ranges: &[],
        });
        let screen_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("screen-pipeline-layout"),
                bind_group_layouts: &[&screen_layout],
                push_constant_ranges: &[],
            });

        let mesh_layout = wgpu::VertexBufferLayout {
            array_stride: (VERTEX_STRIDE * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        };
        let quad_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: (2 * std::mem::size_of::<f32>()) as u64,
                    shader_location: 1,
                },
            ],
        };

        let lamp_stages = Stages {
            vertex: &lamp_vertex,
            fragment: &lamp_fragment,
            layout: &lamp_pipeline_layout,
            buffer: mesh_layout.clone(),
        };
        let lamp_offscreen_pipeline = create_pipeline(
            &device,
            "lamp-offscreen-pipeline",
            &lamp_stages,
            COLOR_FORMAT,
            Some(DEPTH_STENCIL_FORMAT),
        );
        let lamp_surface_pipeline = create_pipeline(
            &device,
            "lamp-surface-pipeline",
            &lamp_stages,
            surface_format,
            None,
        );
        let screen_pipeline = create_pipeline(
            &device,
            "screen-pipeline",
            &Stages {
                vertex: &screen_vertex,
                fragment: &screen_fragment,
                layout: &screen_pipeline_layout,
                buffer: quad_layout,
            },
            surface_format,
            None,
        );

        let screen_quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen-quad"),
            contents: bytemuck::cast_slice(&SCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let primary = MeshBuffers::from_mesh(&device, &assets.primary_model, "primary-model");
        let light = MeshBuffers::from_mesh(&device, &assets.light_model, "light-model");

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            offscreen,
            lamp_offscreen_pipeline,
            lamp_surface_pipeline,
            screen_pipeline,
            uniform_buffer,
            uniform_stride,
            lamp_bind_group,
            screen_bind_group,
            screen_quad,
            primary,
            light,
            uniforms,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Completeness of the offscreen target, as checked at creation.
    pub fn framebuffer_status(&self) -> Result<(), FramebufferError> {
        self.offscreen.status()
    }

    /// Reconfigures the swap chain. The offscreen target keeps its startup
    /// size.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Executes the frame's commands and presents the result.
    pub fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        let passes = plan_passes(&frame.commands, &mut self.uniforms)?;

        let lamp_draws: Vec<&[f32]> = passes
            .iter()
            .flat_map(|pass| &pass.draws)
            .filter(|draw| draw.shader == ShaderId::Lamp)
            .map(|draw| draw.uniforms.as_slice())
            .collect();
        if lamp_draws.len() > MAX_DRAWS {
            return Err(FrameError::TooManyDraws {
                count: lamp_draws.len(),
                capacity: MAX_DRAWS,
            }
            .into());
        }
        for (slot, floats) in lamp_draws.iter().enumerate() {
            self.queue.write_buffer(
                &self.uniform_buffer,
                slot as u64 * self.uniform_stride,
                bytemuck::cast_slice(floats),
            );
        }

        let (width, height) = frame.viewport;
        if (width, height) != (self.size.width, self.size.height) {
            self.resize(PhysicalSize::new(width, height));
        }

        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let mut slot = 0u64;
        for plan in &passes {
            let (color_view, depth_view, lamp_pipeline) = match plan.target {
                Target::Offscreen => (
                    &self.offscreen.color_view,
                    Some(&self.offscreen.depth_view),
                    &self.lamp_offscreen_pipeline,
                ),
                Target::Default => (&surface_view, None, &self.lamp_surface_pipeline),
            };
            let color_load = match plan.clear_color {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: f64::from(r),
                    g: f64::from(g),
                    b: f64::from(b),
                    a: f64::from(a),
                }),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = if plan.clear_depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(match plan.target {
                    Target::Offscreen => "offscreen-pass",
                    Target::Default => "surface-pass",
                }),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: depth_view.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &plan.draws {
                match draw.mesh {
                    DrawMesh::Model(id) => {
                        let mesh = match id {
                            ModelId::Primary => &self.primary,
                            ModelId::Light => &self.light,
                        };
                        let offset = (slot * self.uniform_stride) as u32;
                        slot += 1;
                        pass.set_pipeline(lamp_pipeline);
                        pass.set_bind_group(0, &self.lamp_bind_group, &[offset]);
                        pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                        pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    }
                    DrawMesh::ScreenQuad => {
                        pass.set_pipeline(&self.screen_pipeline);
                        pass.set_bind_group(0, &self.screen_bind_group, &[]);
                        pass.set_vertex_buffer(0, self.screen_quad.slice(..));
                        pass.draw(0..SCREEN_QUAD.len() as u32, 0..1);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Failure while rendering a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

struct Stages<'a> {
    vertex: &'a wgpu::ShaderModule,
    fragment: &'a wgpu::ShaderModule,
    layout: &'a wgpu::PipelineLayout,
    buffer: wgpu::VertexBufferLayout<'a>,
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    stages: &Stages<'_>,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(stages.layout),
        vertex: wgpu::VertexState {
            module: stages.vertex,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: std::slice::from_ref(&stages.buffer),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: stages.fragment,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

/// Prefers a linear (non-sRGB) format so clear colors and sampled texels
/// reach the screen unconverted.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

fn shader_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn align_to(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        }
    }
}
