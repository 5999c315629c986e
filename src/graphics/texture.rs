use log::debug;

use super::chunking::ChunkDescriptor;
use super::vertex::{chunk_quad, VertexBuffer};

pub struct ChunkTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub vertices: VertexBuffer,
    pub bind_group: wgpu::BindGroup,
    pub block_count: u32,
    pub freq_count: u32,
}

/// GPU copies of the current chunk set. Loading a new set releases the old
/// one first; the two never coexist.
pub struct ChunkTextures {
    chunks: Vec<ChunkTexture>,
}

impl ChunkTextures {
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkTexture> {
        self.chunks.iter()
    }

    pub fn replace(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        descriptors: &[ChunkDescriptor],
    ) {
        self.release();
        self.chunks = descriptors
            .iter()
            .map(|descriptor| Self::upload(device, queue, layout, descriptor))
            .collect();
        debug!("Uploaded {} chunk textures", self.chunks.len());
    }

    pub fn release(&mut self) {
        for chunk in self.chunks.drain(..) {
            chunk.texture.destroy();
            chunk.vertices.buffer.destroy();
        }
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        descriptor: &ChunkDescriptor,
    ) -> ChunkTexture {
        let width = descriptor.block_count as u32;
        let height = descriptor.freq_count as u32;
        let label = format!("Spectrogram Chunk {}", descriptor.index);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&descriptor.samples),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let vertices = VertexBuffer::new(device, &format!("{} Vertices", label), &chunk_quad(descriptor));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
            label: Some(&label),
        });

        ChunkTexture {
            texture,
            view,
            vertices,
            bind_group,
            block_count: width,
            freq_count: height,
        }
    }
}

impl Default for ChunkTextures {
    fn default() -> Self {
        Self::new()
    }
}
