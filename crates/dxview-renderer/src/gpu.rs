//! 基于wgpu的GPU资源与离屏渲染
//!
//! `WgpuBackend` 为每个图元创建顶点缓冲；`StillFrameRenderer` 把当前模型渲染到
//! 离屏纹理并读回 RGBA 像素，供 PNG 导出使用。

use crate::camera::CameraState;
use crate::error::RenderError;
use crate::model::{GpuBackend, ModelContainer};
use crate::vertex::{line_list, point_list, CameraUniform, LineVertex};
use dxview_core::primitive::RenderPrimitive;
use dxview_core::properties::Color;
use wgpu::util::DeviceExt;

/// 离屏渲染使用的纹理格式
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// 单个图元的 GPU 缓冲
#[derive(Debug)]
pub struct GpuPrimitive {
    /// line-list 顶点缓冲与顶点数
    pub lines: Option<(wgpu::Buffer, u32)>,
    /// point-list 顶点缓冲与顶点数
    pub points: Option<(wgpu::Buffer, u32)>,
}

/// wgpu 资源后端
pub struct WgpuBackend {
    device: wgpu::Device,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    fn vertex_buffer(&self, label: &str, vertices: &[LineVertex]) -> Option<(wgpu::Buffer, u32)> {
        if vertices.is_empty() {
            return None;
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Some((buffer, vertices.len() as u32))
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = GpuPrimitive;

    fn upload(&mut self, primitive: &RenderPrimitive) -> GpuPrimitive {
        GpuPrimitive {
            lines: self.vertex_buffer("Primitive Lines", &line_list(primitive)),
            points: self.vertex_buffer("Primitive Points", &point_list(primitive)),
        }
    }

    fn release(&mut self, buffer: GpuPrimitive) {
        for (buffer, _) in [buffer.lines, buffer.points].into_iter().flatten() {
            buffer.destroy();
        }
    }
}

/// 读回的像素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// 行优先、无填充的 RGBA8
    pub rgba: Vec<u8>,
}

/// 请求一个无窗口的设备（命令行导出等场景）
pub fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue), RenderError> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Adapter(e.to_string()))?;

        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("DXView Device"),
                ..Default::default()
            })
            .await
            .map_err(|e| RenderError::Device(e.to_string()))
    })
}

/// 离屏静帧渲染器
pub struct StillFrameRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    line_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl StillFrameRenderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
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

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let line_pipeline = create_pipeline(
            &device,
            &layout,
            &shader,
            wgpu::PrimitiveTopology::LineList,
            "Line Pipeline",
        );
        let point_pipeline = create_pipeline(
            &device,
            &layout,
            &shader,
            wgpu::PrimitiveTopology::PointList,
            "Point Pipeline",
        );

        Self {
            device,
            queue,
            line_pipeline,
            point_pipeline,
            camera_buffer,
            camera_bind_group,
        }
    }

    /// 渲染当前模型（含辅助线）并读回像素
    pub fn render(
        &self,
        model: &ModelContainer<WgpuBackend>,
        overlay: &[LineVertex],
        camera: &CameraState,
        width: u32,
        height: u32,
        background: Color,
    ) -> Result<PixelBuffer, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidFrameSize { width, height });
        }

        let mut frame_camera = camera.clone();
        frame_camera.aspect = width as f64 / height as f64;
        let uniform = CameraUniform::from_view_projection(&frame_camera.view_projection());
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Still Frame"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let overlay_buffer = (!overlay.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Overlay Lines"),
                    contents: bytemuck::cast_slice(overlay),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Still Frame Encoder"),
            });

        {
            let [r, g, b, a] = background.to_f32_array();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Still Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            pass.set_pipeline(&self.line_pipeline);
            if let Some(buffer) = &overlay_buffer {
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..overlay.len() as u32, 0..1);
            }
            for (primitive, gpu) in model.iter() {
                if let (true, Some((buffer, count))) = (primitive.visible, &gpu.lines) {
                    pass.set_vertex_buffer(0, buffer.slice(..));
                    pass.draw(0..*count, 0..1);
                }
            }

            pass.set_pipeline(&self.point_pipeline);
            for (primitive, gpu) in model.iter() {
                if let (true, Some((buffer, count))) = (primitive.visible, &gpu.points) {
                    pass.set_vertex_buffer(0, buffer.slice(..));
                    pass.draw(0..*count, 0..1);
                }
            }
        }

        let unpadded_bytes_per_row = width * 4;
        let padded_bytes_per_row = unpadded_bytes_per_row
            .div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Still Frame Readback"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RenderError::Readback(e.to_string()))?;
        rx.recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let mut rgba = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in 0..height {
            let start = (row * padded_bytes_per_row) as usize;
            rgba.extend_from_slice(&data[start..start + unpadded_bytes_per_row as usize]);
        }
        drop(data);
        readback.unmap();
        readback.destroy();
        texture.destroy();

        tracing::debug!("Rendered still frame {}x{}", width, height);
        Ok(PixelBuffer {
            width,
            height,
            rgba,
        })
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[LineVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: FRAME_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
