use log::info;

use crate::error::{ProtocolError, Result, ViewerError};

/// Hardware limits that decide how a spectrogram is cut into textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererCaps {
    /// Largest texture dimension, in texels.
    pub max_texture_size: usize,
    /// Number of textures the renderer can bind for one draw.
    pub max_texture_units: usize,
}

impl RendererCaps {
    pub fn new(max_texture_size: usize, max_texture_units: usize) -> Self {
        Self {
            max_texture_size: max_texture_size.max(1),
            max_texture_units: max_texture_units.max(1),
        }
    }

    pub fn from_limits(limits: &wgpu::Limits) -> Self {
        Self::new(
            limits.max_texture_dimension_2d as usize,
            limits.max_sampled_textures_per_shader_stage as usize,
        )
    }

    /// Apply configured limits. An override can only lower a limit, never
    /// raise it past what the device reported.
    pub fn with_overrides(self, max_texture_size: Option<usize>, max_texture_units: Option<usize>) -> Self {
        Self::new(
            max_texture_size.map_or(self.max_texture_size, |size| size.min(self.max_texture_size)),
            max_texture_units.map_or(self.max_texture_units, |units| units.min(self.max_texture_units)),
        )
    }
}

impl Default for RendererCaps {
    fn default() -> Self {
        Self::from_limits(&wgpu::Limits::default())
    }
}

/// Where one chunk sits on the time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkLayout {
    pub index: usize,
    pub block_start: usize,
    pub block_count: usize,
    /// `[min_x, max_x]` as a fraction of the whole time axis.
    pub x_range: [f64; 2],
}

/// One GPU texture worth of spectrogram data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDescriptor {
    pub index: usize,
    pub x_range: [f64; 2],
    pub block_count: usize,
    pub freq_count: usize,
    /// Frequency-major: row `y` holds bin `y` for every block in the chunk.
    pub samples: Vec<f32>,
}

/// Split `nblocks` into runs of at most `max_blocks`. Every chunk but the
/// last is full; the last chunk's range ends at exactly 1.0.
pub fn partition(nblocks: usize, max_blocks: usize) -> Vec<ChunkLayout> {
    if nblocks == 0 || max_blocks == 0 {
        return Vec::new();
    }

    let num_chunks = nblocks.div_ceil(max_blocks);
    (0..num_chunks)
        .map(|index| {
            let block_start = index * max_blocks;
            let last = index + 1 == num_chunks;
            let block_count = if last { nblocks - block_start } else { max_blocks };
            let min_x = index as f64 / num_chunks as f64;
            let max_x = if last { 1.0 } else { (index + 1) as f64 / num_chunks as f64 };

            ChunkLayout {
                index,
                block_start,
                block_count,
                x_range: [min_x, max_x],
            }
        })
        .collect()
}

/// Turn a block-major slice (`nfreqs` values per block) into frequency-major
/// rows: `out[x + block_count * y] = block_major[y + nfreqs * x]`.
pub fn transpose_blocks(block_major: &[f32], block_count: usize, nfreqs: usize) -> Vec<f32> {
    debug_assert_eq!(block_major.len(), block_count * nfreqs);

    let mut rows = vec![0.0; block_count * nfreqs];
    for x in 0..block_count {
        for y in 0..nfreqs {
            rows[x + block_count * y] = block_major[y + nfreqs * x];
        }
    }
    rows
}

pub struct ChunkPlanner {
    caps: RendererCaps,
}

impl ChunkPlanner {
    pub fn new(caps: RendererCaps) -> Self {
        Self { caps }
    }

    pub fn caps(&self) -> RendererCaps {
        self.caps
    }

    /// Chunk layout for a grid, checked against the renderer's limits.
    pub fn layout(&self, nblocks: usize, nfreqs: usize) -> Result<Vec<ChunkLayout>> {
        if nblocks == 0 || nfreqs == 0 {
            return Err(ProtocolError::InvalidContent {
                kind: "spectrogram".to_string(),
                reason: format!("empty {}x{} grid", nblocks, nfreqs),
            }
            .into());
        }

        if nfreqs > self.caps.max_texture_size {
            return Err(ViewerError::Capability {
                required: nfreqs,
                available: self.caps.max_texture_size,
                what: "texels per texture row",
            });
        }

        let layout = partition(nblocks, self.caps.max_texture_size);
        if layout.len() > self.caps.max_texture_units {
            return Err(ViewerError::Capability {
                required: layout.len(),
                available: self.caps.max_texture_units,
                what: "texture units",
            });
        }

        Ok(layout)
    }

    /// Cut a block-major grid into transposed chunk descriptors.
    pub fn plan(&self, samples: &[f32], nblocks: usize, nfreqs: usize) -> Result<Vec<ChunkDescriptor>> {
        if samples.len() != nblocks * nfreqs {
            return Err(ProtocolError::InvalidContent {
                kind: "spectrogram".to_string(),
                reason: format!("{} samples for a {}x{} grid", samples.len(), nblocks, nfreqs),
            }
            .into());
        }

        let layout = self.layout(nblocks, nfreqs)?;
        info!("Cutting up spectrogram in {} textures", layout.len());

        Ok(layout
            .into_iter()
            .map(|chunk| {
                let start = chunk.block_start * nfreqs;
                let end = (chunk.block_start + chunk.block_count) * nfreqs;
                ChunkDescriptor {
                    index: chunk.index,
                    x_range: chunk.x_range,
                    block_count: chunk.block_count,
                    freq_count: nfreqs,
                    samples: transpose_blocks(&samples[start..end], chunk.block_count, nfreqs),
                }
            })
            .collect())
    }
}
