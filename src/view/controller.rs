use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::extent::{Axis, DataExtent, Extent, DEFAULT_AMPLITUDE_RANGE};

/// A mouse wheel / trackpad scroll over the spectrogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub delta_x: f64,
    pub delta_y: f64,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
}

impl WheelEvent {
    pub fn action(&self) -> WheelAction {
        if self.ctrl {
            WheelAction::Zoom
        } else if self.alt {
            WheelAction::Amplitude
        } else {
            WheelAction::Pan
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAction {
    Pan,
    Zoom,
    Amplitude,
}

/// Pointer position in canvas pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorReadout {
    pub time: f64,
    pub frequency: f64,
}

/// What an input handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputResponse {
    /// The host should suppress its native scroll behaviour.
    pub prevent_default: bool,
    pub view_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSettings {
    /// Scales pan distance relative to `delta * width / 100`.
    pub pan_speed: f64,
    /// dB moved per wheel delta unit when rescaling amplitude.
    pub amplitude_speed: f64,
    pub default_amplitude: [f64; 2],
    pub min_amplitude_half_range: f64,
    /// Smallest view width as a fraction of the data width.
    pub min_view_fraction: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            pan_speed: 0.25,
            amplitude_speed: 0.1,
            default_amplitude: DEFAULT_AMPLITUDE_RANGE,
            min_amplitude_half_range: 1.0,
            min_view_fraction: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ViewportState {
    Unloaded,
    Loaded { data: DataExtent, view: Extent },
}

/// Owns the data extent and the visible window, and turns input into
/// clamped view mutations.
pub struct ViewportController {
    settings: ViewportSettings,
    state: ViewportState,
}

impl ViewportController {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            settings,
            state: ViewportState::Unloaded,
        }
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    /// Replace data and view together; the previous pair is discarded.
    pub fn load(&mut self, data: DataExtent) -> Extent {
        let view = data.initial_view(self.settings.default_amplitude);
        self.state = ViewportState::Loaded { data, view };
        debug!(
            "Loaded extent T={:?} F={:?} ({}x{} samples)",
            view.range(Axis::Time),
            view.range(Axis::Frequency),
            data.num_t(),
            data.num_f()
        );
        view
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ViewportState::Loaded { .. })
    }

    pub fn data_extent(&self) -> Option<&DataExtent> {
        match &self.state {
            ViewportState::Loaded { data, .. } => Some(data),
            ViewportState::Unloaded => None,
        }
    }

    pub fn view_extent(&self) -> Option<&Extent> {
        match &self.state {
            ViewportState::Loaded { view, .. } => Some(view),
            ViewportState::Unloaded => None,
        }
    }

    pub fn handle_wheel(&mut self, wheel: &WheelEvent) -> InputResponse {
        let settings = self.settings;
        let (data, view) = match &mut self.state {
            ViewportState::Loaded { data, view } => (*data.bounds(), view),
            ViewportState::Unloaded => {
                debug!("Ignoring wheel event, no spectrogram loaded");
                return InputResponse::default();
            }
        };

        if !(wheel.delta_x.is_finite() && wheel.delta_y.is_finite()) {
            debug!("Ignoring wheel event with non-finite delta {:?}", wheel);
            return InputResponse {
                prevent_default: true,
                view_changed: false,
            };
        }

        let before = *view;
        match wheel.action() {
            WheelAction::Pan => pan(view, &data, wheel, &settings),
            WheelAction::Zoom => zoom(view, &data, wheel, &settings),
            WheelAction::Amplitude => rescale_amplitude(view, wheel, &settings),
        }
        trace!("{:?} {:?} -> {:?}", wheel.action(), wheel, view);

        InputResponse {
            prevent_default: true,
            view_changed: *view != before,
        }
    }

    /// Time and frequency under the pointer. Frequency grows upwards.
    pub fn cursor(&self, pointer: &PointerEvent) -> Option<CursorReadout> {
        let view = self.view_extent()?;
        if pointer.width <= 0.0 || pointer.height <= 0.0 {
            return None;
        }

        let x = pointer.x / pointer.width;
        let y = pointer.y / pointer.height;
        Some(CursorReadout {
            time: view.scale(Axis::Time, x),
            frequency: view.scale(Axis::Frequency, 1.0 - y),
        })
    }
}

fn pan(view: &mut Extent, data: &Extent, wheel: &WheelEvent, settings: &ViewportSettings) {
    // wheel down scrolls towards lower frequencies
    let (time_delta, freq_delta) = if wheel.shift {
        (wheel.delta_y, wheel.delta_x)
    } else {
        (wheel.delta_x, -wheel.delta_y)
    };

    for (axis, delta) in [(Axis::Time, time_delta), (Axis::Frequency, freq_delta)] {
        let shift = delta * view.width(axis) / 100.0 * settings.pan_speed;
        view.translate(axis, shift);
        clamp_axis(view, data, axis);
    }
}

fn zoom(view: &mut Extent, data: &Extent, wheel: &WheelEvent, settings: &ViewportSettings) {
    let axes: &[Axis] = if wheel.shift { &[Axis::Time] } else { &Axis::PLANAR };

    for &axis in axes {
        let width = view.width(axis);
        let data_width = data.width(axis);
        let delta = wheel.delta_y * width / 100.0;

        if width + delta >= data_width {
            view.set_range(axis, data.min(axis), data.max(axis));
            continue;
        }

        let delta = delta.max(data_width * settings.min_view_fraction - width);
        view.set_range(axis, view.min(axis) - delta / 2.0, view.max(axis) + delta / 2.0);
        clamp_axis(view, data, axis);
    }
}

fn rescale_amplitude(view: &mut Extent, wheel: &WheelEvent, settings: &ViewportSettings) {
    let (center_delta, range_delta) = if wheel.shift {
        (wheel.delta_x, wheel.delta_y)
    } else {
        (wheel.delta_y, wheel.delta_x)
    };

    let center = view.center(Axis::Amplitude) + center_delta * settings.amplitude_speed;
    let half_range = (view.width(Axis::Amplitude) / 2.0 + range_delta * settings.amplitude_speed)
        .max(settings.min_amplitude_half_range);
    view.set_range(Axis::Amplitude, center - half_range, center + half_range);
}

/// Move `view` back inside `data` on one axis, keeping its width.
fn clamp_axis(view: &mut Extent, data: &Extent, axis: Axis) {
    let (data_min, data_max) = (data.min(axis), data.max(axis));
    let (mut min, mut max) = (view.min(axis), view.max(axis));

    if max - min >= data_max - data_min {
        min = data_min;
        max = data_max;
    } else if min < data_min {
        max += data_min - min;
        min = data_min;
    } else if max > data_max {
        min -= max - data_max;
        max = data_max;
    }

    // rounding in the translation may leave an ulp outside
    view.set_range(axis, min.max(data_min), max.min(data_max));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> ViewportController {
        let mut controller = ViewportController::new(ViewportSettings::default());
        controller.load(DataExtent::new(Extent::planar(0.0, 10.0, 0.0, 22050.0), 430, 513));
        controller
    }

    fn wheel(delta_x: f64, delta_y: f64) -> WheelEvent {
        WheelEvent {
            delta_x,
            delta_y,
            ..Default::default()
        }
    }

    fn ctrl_wheel(delta_y: f64) -> WheelEvent {
        WheelEvent {
            delta_y,
            ctrl: true,
            ..Default::default()
        }
    }

    fn view(controller: &ViewportController) -> Extent {
        *controller.view_extent().unwrap()
    }

    #[test]
    fn test_unloaded_ignores_input() {
        let mut controller = ViewportController::new(ViewportSettings::default());
        assert_eq!(controller.handle_wheel(&wheel(10.0, 10.0)), InputResponse::default());
        assert!(controller.cursor(&PointerEvent { x: 1.0, y: 1.0, width: 2.0, height: 2.0 }).is_none());
        assert!(!controller.is_loaded());
    }

    #[test]
    fn test_non_finite_delta_leaves_view_alone() {
        let mut controller = loaded();
        let before = view(&controller);

        for event in [ctrl_wheel(f64::NAN), wheel(f64::INFINITY, 0.0), wheel(0.0, f64::NEG_INFINITY)] {
            let response = controller.handle_wheel(&event);
            assert!(response.prevent_default);
            assert!(!response.view_changed);
        }
        let alt = WheelEvent {
            delta_y: f64::NAN,
            alt: true,
            ..Default::default()
        };
        controller.handle_wheel(&alt);

        assert_eq!(view(&controller), before);
    }

    #[test]
    fn test_load_initialises_view() {
        let controller = loaded();
        let view = view(&controller);
        assert_eq!(view.range(Axis::Time), [0.0, 10.0]);
        assert_eq!(view.range(Axis::Frequency), [0.0, 22050.0]);
        assert_eq!(view.range(Axis::Amplitude), [-120.0, 0.0]);
    }

    #[test]
    fn test_zoom_out_saturates_at_data_extent() {
        let mut controller = loaded();
        let response = controller.handle_wheel(&ctrl_wheel(1e6));

        assert!(response.prevent_default);
        let view = view(&controller);
        assert_eq!(view.width(Axis::Time), 10.0);
        assert_eq!(view.width(Axis::Frequency), 22050.0);
    }

    #[test]
    fn test_zoom_in_then_out() {
        let mut controller = loaded();
        controller.handle_wheel(&ctrl_wheel(-50.0));

        let zoomed = view(&controller);
        assert!((zoomed.width(Axis::Time) - 5.0).abs() < 1e-9);
        assert!((zoomed.center(Axis::Time) - 5.0).abs() < 1e-9);
        assert!((zoomed.width(Axis::Frequency) - 11025.0).abs() < 1e-6);

        for _ in 0..20 {
            controller.handle_wheel(&ctrl_wheel(30.0));
        }
        assert_eq!(view(&controller).range(Axis::Time), [0.0, 10.0]);
        assert_eq!(view(&controller).range(Axis::Frequency), [0.0, 22050.0]);
    }

    #[test]
    fn test_shift_zoom_only_touches_time() {
        let mut controller = loaded();
        controller.handle_wheel(&WheelEvent {
            delta_y: -50.0,
            ctrl: true,
            shift: true,
            ..Default::default()
        });

        let view = view(&controller);
        assert!((view.width(Axis::Time) - 5.0).abs() < 1e-9);
        assert_eq!(view.range(Axis::Frequency), [0.0, 22050.0]);
    }

    #[test]
    fn test_zoom_in_never_inverts() {
        let mut controller = loaded();
        controller.handle_wheel(&ctrl_wheel(-1e6));

        let view = view(&controller);
        assert!(view.width(Axis::Time) > 0.0);
        assert!(view.width(Axis::Frequency) > 0.0);
    }

    #[test]
    fn test_pan_is_clamped() {
        let mut controller = loaded();
        controller.handle_wheel(&ctrl_wheel(-50.0));

        for _ in 0..100 {
            controller.handle_wheel(&wheel(500.0, 0.0));
        }
        let view = view(&controller);
        assert_eq!(view.max(Axis::Time), 10.0);
        assert!((view.width(Axis::Time) - 5.0).abs() < 1e-9);

        for _ in 0..100 {
            controller.handle_wheel(&wheel(-500.0, 0.0));
        }
        assert_eq!(controller.view_extent().unwrap().min(Axis::Time), 0.0);
    }

    #[test]
    fn test_pan_directions() {
        let mut controller = loaded();
        controller.handle_wheel(&ctrl_wheel(-50.0));
        let start = view(&controller);

        // wheel down lowers the frequency window
        controller.handle_wheel(&wheel(0.0, 10.0));
        assert!(view(&controller).center(Axis::Frequency) < start.center(Axis::Frequency));
        assert_eq!(view(&controller).range(Axis::Time), start.range(Axis::Time));

        // shift routes vertical scroll to time
        let before = view(&controller);
        controller.handle_wheel(&WheelEvent {
            delta_y: 10.0,
            shift: true,
            ..Default::default()
        });
        assert!(view(&controller).center(Axis::Time) > before.center(Axis::Time));
        assert_eq!(view(&controller).range(Axis::Frequency), before.range(Axis::Frequency));
    }

    #[test]
    fn test_pan_at_full_extent_does_nothing() {
        let mut controller = loaded();
        let response = controller.handle_wheel(&wheel(100.0, -100.0));
        assert!(response.prevent_default);
        assert!(!response.view_changed);
    }

    #[test]
    fn test_amplitude_rescale() {
        let mut controller = loaded();
        let alt = |delta_x, delta_y, shift| WheelEvent {
            delta_x,
            delta_y,
            shift,
            alt: true,
            ..Default::default()
        };

        controller.handle_wheel(&alt(0.0, 100.0, false));
        let view_a = view(&controller);
        assert!((view_a.center(Axis::Amplitude) - -50.0).abs() < 1e-9);
        assert!((view_a.width(Axis::Amplitude) - 120.0).abs() < 1e-9);

        controller.handle_wheel(&alt(0.0, -1e5, true));
        let view_b = view(&controller);
        assert_eq!(view_b.width(Axis::Amplitude), 2.0);
        assert_eq!(view_b.range(Axis::Time), [0.0, 10.0]);
    }

    #[test]
    fn test_amplitude_is_not_clamped_to_data() {
        let mut controller = loaded();
        controller.handle_wheel(&WheelEvent {
            delta_y: 5000.0,
            alt: true,
            ..Default::default()
        });
        assert!(view(&controller).max(Axis::Amplitude) > 100.0);
    }

    #[test]
    fn test_ctrl_takes_precedence() {
        let event = WheelEvent {
            ctrl: true,
            alt: true,
            ..Default::default()
        };
        assert_eq!(event.action(), WheelAction::Zoom);
        assert_eq!(wheel(1.0, 1.0).action(), WheelAction::Pan);
    }

    #[test]
    fn test_cursor_readout_flips_frequency() {
        let controller = loaded();
        let readout = controller
            .cursor(&PointerEvent { x: 200.0, y: 75.0, width: 800.0, height: 300.0 })
            .unwrap();

        assert_eq!(readout.time, 2.5);
        assert_eq!(readout.frequency, 0.75 * 22050.0);
    }

    #[test]
    fn test_reload_replaces_view() {
        let mut controller = loaded();
        controller.handle_wheel(&ctrl_wheel(-50.0));

        controller.load(DataExtent::new(Extent::planar(0.0, 3.0, 0.0, 8000.0), 10, 10));
        assert_eq!(view(&controller).range(Axis::Time), [0.0, 3.0]);
        assert_eq!(controller.data_extent().unwrap().num_t(), 10);
    }
}
