pub mod chunking;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use chunking::{ChunkDescriptor, ChunkLayout, ChunkPlanner, RendererCaps};
pub use renderer::{GpuRenderer, LoggingRenderer, Renderer};
pub use shader::SpectrogramPipeline;
pub use texture::ChunkTextures;
pub use uniforms::ViewUniforms;
pub use vertex::{ChunkVertex, VertexBuffer};
