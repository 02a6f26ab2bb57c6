//! Character grid sizing for covering a surface with monospace glyphs.

use crate::surface::{FontProbe, Measure, Measurement};

/// Default minimum time between two fresh measurements.
pub const DEFAULT_RESIZE_THROTTLE_MS: f64 = 250.0;

/// Size of the character grid, in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
}

/// Cell sizing configuration.
///
/// Converts a [`Measurement`] into a character grid that fully covers it.
#[derive(Clone, Debug)]
pub struct CellSizing {
    /// Character width as a ratio of font size (typically 0.6 for monospace)
    pub char_width_ratio: f64,
    /// Line height as a ratio of font size for `line-height: normal`
    pub normal_line_height_ratio: f64,
    /// Viewports at most this wide use the mobile heuristic
    pub mobile_breakpoint: f64,
    /// Extra pixels added to both axes on mobile
    pub mobile_padding: f64,
    /// Cells generated beyond the visible extent on each axis
    pub overscan: usize,
}

impl Default for CellSizing {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.6,
            normal_line_height_ratio: 1.2,
            mobile_breakpoint: 768.0,
            mobile_padding: 10.0,
            overscan: 2,
        }
    }
}

impl CellSizing {
    /// Whether the measurement describes a narrow (mobile) viewport.
    #[inline]
    pub fn is_mobile(&self, m: &Measurement) -> bool {
        m.inner_width <= self.mobile_breakpoint
    }

    /// Cell size (width, height) in pixels.
    ///
    /// Prefers the font probe and falls back to a viewport heuristic.
    pub fn cell_size(&self, m: &Measurement) -> (f64, f64) {
        if let Some(probe) = m.probe {
            if let Some(cell) = self.probed_cell(&probe) {
                return cell;
            }
        }
        self.heuristic_cell(m)
    }

    fn probed_cell(&self, probe: &FontProbe) -> Option<(f64, f64)> {
        let font_size = if probe.font_size > 0.0 {
            probe.font_size
        } else {
            12.0
        };
        let line_height = match probe.line_height {
            Some(lh) if lh > 0.0 => lh,
            Some(_) => font_size,
            None => font_size * self.normal_line_height_ratio,
        };
        let char_width = if probe.probe_width > 0.0 && probe.probe_len > 0 {
            probe.probe_width / probe.probe_len as f64
        } else {
            font_size * self.char_width_ratio
        };

        (char_width.is_finite() && char_width > 0.0 && line_height.is_finite())
            .then_some((char_width, line_height))
    }

    fn heuristic_cell(&self, m: &Measurement) -> (f64, f64) {
        let vmin = m.width.min(m.height).max(0.0) / 100.0;
        let font_size = if self.is_mobile(m) {
            (vmin * 1.8).clamp(5.0, 8.0)
        } else {
            (vmin * 1.2).clamp(8.0, 12.0)
        };
        (font_size * self.char_width_ratio, font_size)
    }

    /// Compute the grid for a measurement.
    ///
    /// Each axis is `ceil(extent / cell) + overscan`, so the grid always
    /// covers the surface when overflow is clipped.
    pub fn compute(&self, m: &Measurement) -> GridSize {
        let mut extent = (sanitize(m.width), sanitize(m.height));
        if self.is_mobile(m) {
            extent.0 += self.mobile_padding;
            extent.1 += self.mobile_padding;
        }

        let (char_width, line_height) = self.cell_size(m);
        GridSize {
            width: (extent.0 / char_width).ceil() as usize + self.overscan,
            height: (extent.1 / line_height).ceil() as usize + self.overscan,
        }
    }
}

fn sanitize(extent: f64) -> f64 {
    if extent.is_finite() {
        extent.max(0.0)
    } else {
        0.0
    }
}

/// Parse a CSS pixel length such as `"12px"` or `"14.4px"`.
pub fn parse_css_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Throttled, cached grid size calculator.
///
/// A fresh measurement is taken only when the cache is empty or at least
/// the throttle window has elapsed since the previous one; call
/// [`invalidate`](Self::invalidate) on structural changes.
///
/// ## Example
///
/// ```rust
/// use folio_ambience::{DimensionCalculator, BufferSurface, Measurement};
///
/// let mut surface = BufferSurface::new(Measurement::viewport(800.0, 600.0));
/// let mut dims = DimensionCalculator::new();
/// let first = dims.grid_size(&surface, 0.0);
///
/// surface.measurement = Measurement::viewport(1600.0, 1200.0);
/// assert_eq!(dims.grid_size(&surface, 100.0), first);
/// assert_ne!(dims.grid_size(&surface, 300.0), first);
/// ```
#[derive(Clone, Debug)]
pub struct DimensionCalculator {
    sizing: CellSizing,
    throttle_ms: f64,
    cache: Option<GridSize>,
    last_computed: f64,
}

impl Default for DimensionCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DimensionCalculator {
    pub fn new() -> Self {
        Self::with_throttle(DEFAULT_RESIZE_THROTTLE_MS)
    }

    pub fn with_throttle(throttle_ms: f64) -> Self {
        Self {
            sizing: CellSizing::default(),
            throttle_ms: throttle_ms.max(0.0),
            cache: None,
            last_computed: 0.0,
        }
    }

    /// Replace the cell sizing parameters (drops the cache).
    pub fn set_sizing(&mut self, sizing: CellSizing) {
        self.sizing = sizing;
        self.invalidate();
    }

    #[inline]
    pub fn sizing(&self) -> &CellSizing {
        &self.sizing
    }

    /// Grid size for `source`, reusing the cached value inside the throttle window.
    pub fn grid_size<M: Measure + ?Sized>(&mut self, source: &M, now_ms: f64) -> GridSize {
        if let Some(cached) = self.cache {
            if now_ms - self.last_computed < self.throttle_ms {
                return cached;
            }
        }

        let size = self.sizing.compute(&source.measure());
        self.cache = Some(size);
        self.last_computed = now_ms;
        size
    }

    /// Forget the cached grid.
    #[inline]
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    #[inline]
    pub fn cached(&self) -> Option<GridSize> {
        self.cache
    }
}
