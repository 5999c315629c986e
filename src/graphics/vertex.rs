use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::chunking::ChunkDescriptor;

/// Quad corner in normalized data space (`x` over time, `y` over
/// frequency, both 0..1) with its texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ChunkVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl ChunkVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ChunkVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Triangle-strip quad covering one chunk's slice of the time axis.
/// Texture row 0 (lowest frequency bin) sits at the bottom edge.
pub fn chunk_quad(chunk: &ChunkDescriptor) -> [ChunkVertex; 4] {
    let [min_x, max_x] = chunk.x_range.map(|x| x as f32);
    [
        ChunkVertex { position: [min_x, 0.0], tex_coords: [0.0, 0.0] },
        ChunkVertex { position: [max_x, 0.0], tex_coords: [1.0, 0.0] },
        ChunkVertex { position: [min_x, 1.0], tex_coords: [0.0, 1.0] },
        ChunkVertex { position: [max_x, 1.0], tex_coords: [1.0, 1.0] },
    ]
}

pub struct VertexBuffer {
    pub buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl VertexBuffer {
    pub fn new(device: &wgpu::Device, label: &str, vertices: &[ChunkVertex]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            buffer,
            vertex_count: vertices.len() as u32,
        }
    }
}
