use serde::{Deserialize, Serialize};

/// Amplitude window a fresh view starts with, in dB.
pub const DEFAULT_AMPLITUDE_RANGE: [f64; 2] = [-120.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Time,
    Frequency,
    Amplitude,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Time, Axis::Frequency, Axis::Amplitude];
    /// The axes a view is confined to the data on.
    pub const PLANAR: [Axis; 2] = [Axis::Time, Axis::Frequency];
}

/// Axis-aligned box over time, frequency and amplitude.
///
/// `min > max` on an axis is tolerated while a transform is in progress;
/// `width` is then negative and callers are expected to clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    min_t: f64,
    max_t: f64,
    min_f: f64,
    max_f: f64,
    min_a: f64,
    max_a: f64,
}

impl Extent {
    pub fn new(min_t: f64, max_t: f64, min_f: f64, max_f: f64, min_a: f64, max_a: f64) -> Self {
        Self {
            min_t,
            max_t,
            min_f,
            max_f,
            min_a,
            max_a,
        }
    }

    /// Time/frequency box with the default amplitude window.
    pub fn planar(min_t: f64, max_t: f64, min_f: f64, max_f: f64) -> Self {
        let [min_a, max_a] = DEFAULT_AMPLITUDE_RANGE;
        Self::new(min_t, max_t, min_f, max_f, min_a, max_a)
    }

    pub fn min(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Time => self.min_t,
            Axis::Frequency => self.min_f,
            Axis::Amplitude => self.min_a,
        }
    }

    pub fn max(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Time => self.max_t,
            Axis::Frequency => self.max_f,
            Axis::Amplitude => self.max_a,
        }
    }

    pub fn range(&self, axis: Axis) -> [f64; 2] {
        [self.min(axis), self.max(axis)]
    }

    pub fn width(&self, axis: Axis) -> f64 {
        self.max(axis) - self.min(axis)
    }

    pub fn center(&self, axis: Axis) -> f64 {
        (self.min(axis) + self.max(axis)) / 2.0
    }

    /// Map a normalized position `t` in [0, 1] onto the axis.
    pub fn scale(&self, axis: Axis, t: f64) -> f64 {
        t * self.width(axis) + self.min(axis)
    }

    /// Replace the bounds of one axis. Non-finite bounds are refused and
    /// leave the extent untouched.
    pub fn set_range(&mut self, axis: Axis, min: f64, max: f64) -> bool {
        if !min.is_finite() || !max.is_finite() {
            log::warn!("Ignoring non-finite {:?} range [{}, {}]", axis, min, max);
            return false;
        }

        let (lo, hi) = match axis {
            Axis::Time => (&mut self.min_t, &mut self.max_t),
            Axis::Frequency => (&mut self.min_f, &mut self.max_f),
            Axis::Amplitude => (&mut self.min_a, &mut self.max_a),
        };
        *lo = min;
        *hi = max;
        true
    }

    pub fn translate(&mut self, axis: Axis, delta: f64) -> bool {
        self.set_range(axis, self.min(axis) + delta, self.max(axis) + delta)
    }

    pub fn contains_range(&self, other: &Extent, axis: Axis) -> bool {
        other.min(axis) >= self.min(axis) && other.max(axis) <= self.max(axis)
    }
}

/// Full bounds of a loaded spectrogram plus its sample grid size.
/// Immutable once built; a new load replaces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataExtent {
    bounds: Extent,
    num_t: usize,
    num_f: usize,
}

impl DataExtent {
    pub fn new(bounds: Extent, num_t: usize, num_f: usize) -> Self {
        Self { bounds, num_t, num_f }
    }

    pub fn bounds(&self) -> &Extent {
        &self.bounds
    }

    pub fn num_t(&self) -> usize {
        self.num_t
    }

    pub fn num_f(&self) -> usize {
        self.num_f
    }

    /// Initial view onto this data: identical on T/F, default amplitude window.
    pub fn initial_view(&self, amplitude: [f64; 2]) -> Extent {
        let mut view = self.bounds;
        view.set_range(Axis::Amplitude, amplitude[0], amplitude[1]);
        view
    }
}
