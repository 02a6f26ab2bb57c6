//! Procedural ASCII pattern generation.
//!
//! Every generator maps `(kind, width, height, time)` to `height` rows of
//! exactly `width` glyphs, each row terminated by `'\n'`. Kinds that sample
//! per-cell randomness draw from the caller's RNG; there are no hidden
//! counters, so the same instant and the same RNG state always produce the
//! same text.

use rand::Rng;

/// Glyph ramp ordered from sparsest to densest.
pub const GLYPH_RAMP: [char; 8] = ['.', ':', ';', '+', '*', '%', '@', '#'];

/// Row separator emitted after every row.
pub const ROW_SEPARATOR: char = '\n';

const WAVE_TIME_STEP_MS: f64 = 50.0;
const NOISE_INTENSITY: f64 = 0.4;

// Spacing pairs keep cells visually square for glyphs ~0.6 as wide as tall.
const GRID_SPACING: (usize, usize) = (8, 5);
const GRID_DENSITY: f64 = 0.25;
const GRID_FILLER: f64 = 0.1;
const CIRCUIT_SPACING: (usize, usize) = (12, 7);
const CIRCUIT_FILLER: f64 = 0.05;

/// Named procedural-generation algorithm.
///
/// Unknown names fall back to [`PatternKind::Waves`], both through
/// [`From<&str>`] and when deserializing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PatternKind {
    /// Two interfering sine waves, smooth in time.
    #[default]
    Waves,
    /// Independent random glyphs per cell.
    Noise,
    /// Sparse grid lines over faint filler.
    Grid,
    /// Circuit-board traces with `+` junctions.
    Circuit,
}

impl PatternKind {
    /// All kinds, in declaration order.
    pub const ALL: [PatternKind; 4] = [
        PatternKind::Waves,
        PatternKind::Noise,
        PatternKind::Grid,
        PatternKind::Circuit,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Waves => "waves",
            PatternKind::Noise => "noise",
            PatternKind::Grid => "grid",
            PatternKind::Circuit => "circuit",
        }
    }

    /// Whether the pattern moves continuously with time.
    #[inline]
    pub fn is_time_varying(self) -> bool {
        matches!(self, PatternKind::Waves)
    }
}

impl From<&str> for PatternKind {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "noise" => PatternKind::Noise,
            "grid" => PatternKind::Grid,
            "circuit" => PatternKind::Circuit,
            _ => PatternKind::Waves,
        }
    }
}

impl From<String> for PatternKind {
    fn from(name: String) -> Self {
        PatternKind::from(name.as_str())
    }
}

impl From<PatternKind> for String {
    fn from(kind: PatternKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Generate one pattern as text.
///
/// Returns an empty string when either dimension is zero.
///
/// ## Example
///
/// ```rust
/// use folio_ambience::{generate, PatternKind};
/// use rand::{rngs::SmallRng, SeedableRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let text = generate(PatternKind::Circuit, 24, 8, 0.0, &mut rng);
/// assert_eq!(text.lines().count(), 8);
/// assert!(text.lines().all(|row| row.chars().count() == 24));
/// ```
pub fn generate<R: Rng + ?Sized>(
    kind: PatternKind,
    width: usize,
    height: usize,
    time_ms: f64,
    rng: &mut R,
) -> String {
    if width == 0 || height == 0 {
        return String::new();
    }

    let mut out = String::with_capacity((width + 1) * height);
    for y in 0..height {
        for x in 0..width {
            let glyph = match kind {
                PatternKind::Waves => GLYPH_RAMP[wave_bucket(x, y, time_ms)],
                PatternKind::Noise => noise_cell(rng),
                PatternKind::Grid => grid_cell(x, y, rng),
                PatternKind::Circuit => circuit_cell(x, y, rng),
            };
            out.push(glyph);
        }
        out.push(ROW_SEPARATOR);
    }
    out
}

/// Ramp index of the `waves` glyph at `(x, y)`.
///
/// Time is quantised down to 50 ms steps, so nearby instants share a frame.
pub fn wave_bucket(x: usize, y: usize, time_ms: f64) -> usize {
    let t = (time_ms / WAVE_TIME_STEP_MS).floor() * WAVE_TIME_STEP_MS;
    let wave1 = (x as f64 * 0.08 + t * 0.005).sin() * 0.4;
    let wave2 = (y as f64 * 0.12 + t * 0.004).sin() * 0.4;
    let intensity = (wave1 + wave2 + 1.0) * 0.5;
    let index = (intensity * GLYPH_RAMP.len() as f64).floor() as usize;
    index.min(GLYPH_RAMP.len() - 1)
}

fn noise_cell<R: Rng + ?Sized>(rng: &mut R) -> char {
    let value: f64 = rng.gen();
    if value < NOISE_INTENSITY {
        let index = (value * GLYPH_RAMP.len() as f64 / NOISE_INTENSITY) as usize;
        GLYPH_RAMP[index.min(GLYPH_RAMP.len() - 1)]
    } else {
        ' '
    }
}

fn grid_cell<R: Rng + ?Sized>(x: usize, y: usize, rng: &mut R) -> char {
    let (sx, sy) = GRID_SPACING;
    let on_column = x % sx == 0;
    let on_row = y % sy == 0;

    if on_column && on_row {
        return '+';
    }
    if (on_column || on_row) && rng.gen::<f64>() < GRID_DENSITY {
        return GLYPH_RAMP[2 + rng.gen_range(0..4)];
    }
    if rng.gen::<f64>() < GRID_FILLER {
        GLYPH_RAMP[0]
    } else {
        ' '
    }
}

fn circuit_cell<R: Rng + ?Sized>(x: usize, y: usize, rng: &mut R) -> char {
    let (sx, sy) = CIRCUIT_SPACING;
    match (x % sx == 0, y % sy == 0) {
        (true, true) => '+',
        (true, false) => '|',
        (false, true) => '-',
        (false, false) => {
            if rng.gen::<f64>() < CIRCUIT_FILLER {
                '.'
            } else {
                ' '
            }
        }
    }
}

/// One generated pattern together with its grid dimensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternFrame {
    /// Columns per row
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Rows of glyphs, each terminated by `'\n'`
    pub text: String,
}

impl PatternFrame {
    /// Generate a frame; see [`generate`].
    pub fn generate<R: Rng + ?Sized>(
        kind: PatternKind,
        width: usize,
        height: usize,
        time_ms: f64,
        rng: &mut R,
    ) -> Self {
        let text = generate(kind, width, height, time_ms, rng);
        if text.is_empty() {
            return Self::default();
        }
        Self {
            width,
            height,
            text,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Dimensions (columns, rows) measured from the text itself.
    pub fn dimensions(&self) -> (usize, usize) {
        let rows = self.text.lines().count();
        let cols = self
            .text
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        (cols, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_dimensions_respected_for_every_kind() {
        let mut rng = rng();
        for kind in PatternKind::ALL {
            for &(w, h) in &[(1, 1), (7, 3), (80, 24), (13, 40)] {
                let text = generate(kind, w, h, 1234.0, &mut rng);
                assert_eq!(text.matches(ROW_SEPARATOR).count(), h, "{kind} {w}x{h}");
                assert_eq!(text.lines().count(), h);
                assert!(text.lines().all(|row| row.chars().count() == w));
            }
        }
    }

    #[test]
    fn test_zero_dimensions_are_empty() {
        let mut rng = rng();
        for kind in PatternKind::ALL {
            assert_eq!(generate(kind, 0, 10, 0.0, &mut rng), "");
            assert_eq!(generate(kind, 10, 0, 0.0, &mut rng), "");
        }
        assert!(PatternFrame::generate(PatternKind::Waves, 0, 0, 0.0, &mut rng).is_empty());
    }

    #[test]
    fn test_unknown_kind_falls_back_to_waves() {
        assert_eq!(PatternKind::from("spiral"), PatternKind::Waves);
        assert_eq!(PatternKind::from(" Circuit "), PatternKind::Circuit);

        let kind: PatternKind = serde_json::from_str("\"plasma\"").unwrap();
        assert_eq!(kind, PatternKind::Waves);
        assert_eq!(serde_json::to_string(&PatternKind::Grid).unwrap(), "\"grid\"");
    }

    #[test]
    fn test_waves_is_pure_in_time() {
        let mut a = SmallRng::seed_from_u64(1);
        let mut b = SmallRng::seed_from_u64(99);
        let first = generate(PatternKind::Waves, 40, 12, 5_000.0, &mut a);
        let second = generate(PatternKind::Waves, 40, 12, 5_000.0, &mut b);
        assert_eq!(first, second);

        // Instants inside one 50 ms step render identically, even out of order.
        let later = generate(PatternKind::Waves, 40, 12, 5_049.0, &mut a);
        assert_eq!(first, later);
    }

    #[test]
    fn test_waves_continuity() {
        let (w, h) = (120, 40);
        let mut within_one = 0;
        for y in 0..h {
            for x in 0..w {
                let before = wave_bucket(x, y, 10_000.0) as i64;
                let after = wave_bucket(x, y, 10_050.0) as i64;
                if (before - after).abs() <= 1 {
                    within_one += 1;
                }
            }
        }
        assert_eq!(within_one, w * h);
    }

    #[test]
    fn test_circuit_structure() {
        let mut rng = rng();
        let text = generate(PatternKind::Circuit, 25, 15, 0.0, &mut rng);
        let rows: Vec<Vec<char>> = text.lines().map(|l| l.chars().collect()).collect();
        assert_eq!(rows[0][0], '+');
        assert_eq!(rows[7][12], '+');
        assert_eq!(rows[3][0], '|');
        assert_eq!(rows[0][5], '-');
        assert!(matches!(rows[3][5], '.' | ' '));
    }

    #[test]
    fn test_grid_junctions() {
        let mut rng = rng();
        let text = generate(PatternKind::Grid, 17, 11, 0.0, &mut rng);
        let rows: Vec<Vec<char>> = text.lines().map(|l| l.chars().collect()).collect();
        assert_eq!(rows[0][0], '+');
        assert_eq!(rows[5][8], '+');
        assert_eq!(rows[10][16], '+');
    }

    #[test]
    fn test_noise_glyphs() {
        let mut rng = rng();
        let text = generate(PatternKind::Noise, 60, 20, 0.0, &mut rng);
        assert!(text
            .chars()
            .all(|c| c == ' ' || c == ROW_SEPARATOR || GLYPH_RAMP.contains(&c)));
        // Roughly 40% of cells are drawn.
        let drawn = text.chars().filter(|c| GLYPH_RAMP.contains(c)).count();
        assert!(drawn > 300 && drawn < 700, "drawn = {drawn}");
    }

    #[test]
    fn test_frame_dimensions() {
        let mut rng = rng();
        let frame = PatternFrame::generate(PatternKind::Waves, 9, 4, 0.0, &mut rng);
        assert_eq!(frame.dimensions(), (9, 4));
        assert_eq!((frame.width, frame.height), (9, 4));
    }
}
