//! Surfaces the animator measures and draws text into.

/// Font metrics read from a live text probe on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontProbe {
    /// Computed font size in pixels
    pub font_size: f64,
    /// Computed line height in pixels (`None` for `line-height: normal`)
    pub line_height: Option<f64>,
    /// Rendered width of the probe text in pixels
    pub probe_width: f64,
    /// Number of glyphs in the probe text
    pub probe_len: usize,
}

/// Snapshot of everything the dimension calculator needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Effective drawable width in pixels
    pub width: f64,
    /// Effective drawable height in pixels
    pub height: f64,
    /// Layout viewport width, used to detect narrow (mobile) screens
    pub inner_width: f64,
    /// Direct font measurement, when the surface can provide one
    pub probe: Option<FontProbe>,
}

impl Measurement {
    /// A measurement with no font probe.
    pub fn viewport(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            inner_width: width,
            probe: None,
        }
    }
}

/// Something that can report its size and font metrics.
pub trait Measure {
    fn measure(&self) -> Measurement;
}

/// A text-bearing presentation surface.
pub trait TextSurface: Measure {
    /// Replace the whole text content of the surface.
    fn set_text(&mut self, text: &str);
}

/// Headless surface that keeps the last text written to it.
///
/// Useful for terminals, snapshots and tests.
#[derive(Clone, Debug)]
pub struct BufferSurface {
    /// Last text written
    pub text: String,
    /// Measurement reported to the dimension calculator
    pub measurement: Measurement,
    /// Number of `set_text` calls so far
    pub writes: usize,
}

impl BufferSurface {
    pub fn new(measurement: Measurement) -> Self {
        Self {
            text: String::new(),
            measurement,
            writes: 0,
        }
    }
}

impl Measure for BufferSurface {
    fn measure(&self) -> Measurement {
        self.measurement
    }
}

impl TextSurface for BufferSurface {
    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.writes += 1;
    }
}
