use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::graphics::RendererCaps;
use crate::view::{ViewportSettings, DEFAULT_AMPLITUDE_RANGE};

/// Viewer settings. Every field has a default, so a config file only needs
/// the values it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// FFT length requested from the server.
    pub nfft: usize,
    /// Overlap between consecutive spectra (0.0-1.0).
    pub overlap: f64,

    /// Caps the renderer's maximum texture dimension. Cannot raise it
    /// above the device limit.
    pub max_texture_size: Option<usize>,
    /// Caps the number of textures bound per draw.
    pub max_texture_units: Option<usize>,

    pub pan_speed: f64,
    pub amplitude_speed: f64,
    /// Initial amplitude window in dB.
    pub default_amplitude: [f64; 2],
    pub min_amplitude_half_range: f64,
    pub min_view_fraction: f64,

    /// Interval of the render tick.
    pub render_interval_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let viewport = ViewportSettings::default();
        Self {
            nfft: 1024,
            overlap: 0.5,
            max_texture_size: None,
            max_texture_units: None,
            pan_speed: viewport.pan_speed,
            amplitude_speed: viewport.amplitude_speed,
            default_amplitude: DEFAULT_AMPLITUDE_RANGE,
            min_amplitude_half_range: viewport.min_amplitude_half_range,
            min_view_fraction: viewport.min_view_fraction,
            render_interval_ms: 15,
        }
    }
}

impl ViewerConfig {
    /// Load config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.nfft == 0 {
            return Err(anyhow::anyhow!("nfft must be positive"));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(anyhow::anyhow!("overlap {} must be in [0, 1)", self.overlap));
        }
        let [min_a, max_a] = self.default_amplitude;
        if !(min_a < max_a) {
            return Err(anyhow::anyhow!("default amplitude window [{}, {}] is empty", min_a, max_a));
        }
        if !(self.min_view_fraction > 0.0 && self.min_view_fraction <= 1.0) {
            return Err(anyhow::anyhow!("min_view_fraction {} must be in (0, 1]", self.min_view_fraction));
        }
        Ok(())
    }

    pub fn viewport_settings(&self) -> ViewportSettings {
        ViewportSettings {
            pan_speed: self.pan_speed,
            amplitude_speed: self.amplitude_speed,
            default_amplitude: self.default_amplitude,
            min_amplitude_half_range: self.min_amplitude_half_range,
            min_view_fraction: self.min_view_fraction,
        }
    }

    /// Renderer limits with this config's overrides applied.
    pub fn renderer_caps(&self, base: RendererCaps) -> RendererCaps {
        base.with_overrides(self.max_texture_size, self.max_texture_units)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }
}
