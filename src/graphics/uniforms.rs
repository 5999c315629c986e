use glam::{Mat4, Vec3, Vec4};

use crate::view::{Axis, DataExtent, Extent};

/// Per-frame shader inputs derived from the current view.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniforms {
    /// Normalized data space -> clip space.
    pub view_proj: [[f32; 4]; 4],
    /// Amplitude window `[min, max]` in dB mapped onto the colormap.
    pub amplitude_range: [f32; 2],
    pub _padding: [f32; 2],
}

impl ViewUniforms {
    pub fn new(data: &DataExtent, view: &Extent) -> Self {
        Self {
            view_proj: view_transform(data.bounds(), view).to_cols_array_2d(),
            amplitude_range: [view.min(Axis::Amplitude) as f32, view.max(Axis::Amplitude) as f32],
            _padding: [0.0; 2],
        }
    }
}

/// Affine map taking the visible window of `data` onto clip space [-1, 1].
pub fn view_transform(data: &Extent, view: &Extent) -> Mat4 {
    let (scale_x, offset_x) = axis_transform(data, view, Axis::Time);
    let (scale_y, offset_y) = axis_transform(data, view, Axis::Frequency);

    Mat4::from_cols(
        Vec4::new(scale_x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, scale_y, 0.0, 0.0),
        Vec4::Z,
        Vec3::new(offset_x, offset_y, 0.0).extend(1.0),
    )
}

fn axis_transform(data: &Extent, view: &Extent, axis: Axis) -> (f32, f32) {
    let data_width = data.width(axis);
    let view_width = view.width(axis);
    if data_width <= 0.0 || view_width <= 0.0 {
        return (2.0, -1.0);
    }

    let start = (view.min(axis) - data.min(axis)) / data_width;
    let fraction = view_width / data_width;
    let scale = 2.0 / fraction;
    (scale as f32, (-start * scale - 1.0) as f32)
}
