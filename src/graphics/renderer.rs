use anyhow::Result;
use log::{debug, info, trace};
use wgpu::util::DeviceExt;

use super::chunking::{ChunkDescriptor, RendererCaps};
use super::shader::SpectrogramPipeline;
use super::texture::ChunkTextures;
use super::uniforms::ViewUniforms;
use crate::view::{DataExtent, Extent};

/// Consumer of chunk descriptors and the current view.
///
/// `load_chunks` is called once per successful load with the complete new
/// chunk set; `draw` is called whenever the session state is dirty.
pub trait Renderer {
    fn caps(&self) -> RendererCaps;

    fn load_chunks(&mut self, chunks: &[ChunkDescriptor]);

    fn draw(&mut self, chunks: &[ChunkDescriptor], data: &DataExtent, view: &Extent);

    /// The drawing surface changed size. Zero-sized requests are ignored.
    fn resize(&mut self, width: u32, height: u32);

    fn frames_drawn(&self) -> u64;

    /// Identification string for logging ("GPU", "log", ...).
    fn renderer_type(&self) -> &'static str;
}

/// Renderer without a GPU that only reports what it would draw.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    caps: RendererCaps,
    size: (u32, u32),
    frames_drawn: u64,
}

impl LoggingRenderer {
    pub fn new(caps: RendererCaps) -> Self {
        Self {
            caps,
            size: (0, 0),
            frames_drawn: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl Renderer for LoggingRenderer {
    fn caps(&self) -> RendererCaps {
        self.caps
    }

    fn load_chunks(&mut self, chunks: &[ChunkDescriptor]) {
        for chunk in chunks {
            debug!(
                "Chunk {}: x={:?}, {}x{} texels",
                chunk.index, chunk.x_range, chunk.block_count, chunk.freq_count
            );
        }
    }

    fn draw(&mut self, chunks: &[ChunkDescriptor], _data: &DataExtent, view: &Extent) {
        self.frames_drawn += 1;
        trace!("Frame {}: {} chunks, view {:?}", self.frames_drawn, chunks.len(), view);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
            debug!("Canvas resized to {}x{}", width, height);
        }
    }

    fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    fn renderer_type(&self) -> &'static str {
        "log"
    }
}

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Keeps chunk textures and view uniforms resident on a wgpu device and
/// draws them into an offscreen target.
pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    limits: wgpu::Limits,
    pipeline: SpectrogramPipeline,
    textures: ChunkTextures,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    target: wgpu::Texture,
    size: (u32, u32),
    frames_drawn: u64,
}

fn create_target(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Spectrogram Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

impl GpuRenderer {
    /// Create a renderer on a headless device, no surface attached.
    pub async fn new_headless(width: u32, height: u32) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        let limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Spectrogram Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits.clone(),
                },
                None,
            )
            .await?;

        info!("Using GPU adapter: {}", adapter.get_info().name);

        let pipeline = SpectrogramPipeline::new(&device, TARGET_FORMAT);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("View Uniform Buffer"),
            contents: bytemuck::cast_slice(&[<ViewUniforms as bytemuck::Zeroable>::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pipeline.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("view_uniform_bind_group"),
        });

        let size = (width.max(1), height.max(1));
        let target = create_target(&device, size.0, size.1);
        info!("Offscreen target {}x{}", size.0, size.1);

        Ok(Self {
            device,
            queue,
            limits,
            pipeline,
            textures: ChunkTextures::new(),
            uniform_buffer,
            uniform_bind_group,
            target,
            size,
            frames_drawn: 0,
        })
    }
}

impl Renderer for GpuRenderer {
    fn caps(&self) -> RendererCaps {
        RendererCaps::from_limits(&self.limits)
    }

    fn load_chunks(&mut self, chunks: &[ChunkDescriptor]) {
        self.textures
            .replace(&self.device, &self.queue, &self.pipeline.chunk_layout, chunks);
        self.queue.submit(std::iter::empty());
    }

    fn draw(&mut self, chunks: &[ChunkDescriptor], data: &DataExtent, view: &Extent) {
        debug_assert_eq!(chunks.len(), self.textures.len());

        let uniforms = ViewUniforms::new(data, view);
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let target_view = self.target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Spectrogram Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Spectrogram Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            for chunk in self.textures.iter() {
                render_pass.set_bind_group(1, &chunk.bind_group, &[]);
                render_pass.set_vertex_buffer(0, chunk.vertices.buffer.slice(..));
                render_pass.draw(0..chunk.vertices.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        self.frames_drawn += 1;
        trace!("GPU frame {} with {} chunk textures", self.frames_drawn, self.textures.len());
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 && (width, height) != self.size {
            self.target.destroy();
            self.target = create_target(&self.device, width, height);
            self.size = (width, height);
            debug!("Offscreen target resized to {}x{}", width, height);
        }
    }

    fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    fn renderer_type(&self) -> &'static str {
        "GPU"
    }
}

impl Drop for GpuRenderer {
    fn drop(&mut self) {
        self.textures.release();
        self.target.destroy();
    }
}
