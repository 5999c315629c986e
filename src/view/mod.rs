pub mod controller;
pub mod extent;

pub use controller::{CursorReadout, InputResponse, PointerEvent, ViewportController, ViewportSettings, WheelAction, WheelEvent};
pub use extent::{Axis, DataExtent, Extent, DEFAULT_AMPLITUDE_RANGE};
