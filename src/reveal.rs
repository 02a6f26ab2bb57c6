//! Progressive reveal: a pattern fades in glyph by glyph in random order.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::pattern::ROW_SEPARATOR;

/// State of one reveal episode.
///
/// `positions` is a shuffled permutation of every non-separator index of
/// the pattern. It stays fixed for the episode and is rebuilt only when the
/// pattern changes shape (resize or pattern switch). The revealed prefix of
/// `positions` only ever grows.
#[derive(Clone, Debug)]
pub struct RevealState {
    full: Vec<char>,
    positions: Vec<usize>,
    mask: Vec<bool>,
    revealed: usize,
    start_time: f64,
    duration: f64,
}

impl RevealState {
    /// Begin an episode at `start_time` lasting `duration_ms`.
    pub fn new<R: Rng + ?Sized>(
        full_pattern: &str,
        start_time: f64,
        duration_ms: f64,
        rng: &mut R,
    ) -> Self {
        let mut state = Self {
            full: Vec::new(),
            positions: Vec::new(),
            mask: Vec::new(),
            revealed: 0,
            start_time,
            duration: if duration_ms > 0.0 { duration_ms } else { 1.0 },
        };
        state.rebuild(full_pattern, rng);
        state
    }

    /// Reshuffle positions for a new pattern; the start time is kept.
    pub fn rebuild<R: Rng + ?Sized>(&mut self, full_pattern: &str, rng: &mut R) {
        self.full = full_pattern.chars().collect();
        self.positions = self
            .full
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != ROW_SEPARATOR)
            .map(|(i, _)| i)
            .collect();
        self.positions.shuffle(rng);
        self.mask = vec![false; self.full.len()];
        self.revealed = 0;
    }

    /// Swap in a freshly generated pattern of the same shape.
    ///
    /// Falls back to [`rebuild`](Self::rebuild) when the shape differs.
    pub fn replace_pattern<R: Rng + ?Sized>(&mut self, full_pattern: &str, rng: &mut R) {
        let same_shape = full_pattern.chars().count() == self.full.len()
            && full_pattern
                .chars()
                .zip(&self.full)
                .all(|(a, &b)| (a == ROW_SEPARATOR) == (b == ROW_SEPARATOR));
        if same_shape {
            self.full.clear();
            self.full.extend(full_pattern.chars());
        } else {
            self.rebuild(full_pattern, rng);
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    #[inline]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[inline]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[inline]
    pub fn progress(&self, now_ms: f64) -> f64 {
        ((now_ms - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_complete(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    /// Whether the glyph at `index` is currently visible.
    #[inline]
    pub fn is_revealed(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    /// Reveal up to `floor(total * progress)` positions.
    pub fn advance(&mut self, now_ms: f64) -> usize {
        let target = (self.total() as f64 * self.progress(now_ms)).floor() as usize;
        let target = target.min(self.total());
        if target > self.revealed {
            for &pos in &self.positions[self.revealed..target] {
                self.mask[pos] = true;
            }
            self.revealed = target;
        }
        self.revealed
    }

    /// The pattern with unrevealed glyphs blanked and separators kept.
    pub fn render(&self) -> String {
        self.full
            .iter()
            .zip(&self.mask)
            .map(|(&c, &shown)| if shown || c == ROW_SEPARATOR { c } else { ' ' })
            .collect()
    }

    /// Advance to `now_ms` and render.
    pub fn render_at(&mut self, now_ms: f64) -> String {
        self.advance(now_ms);
        if self.revealed >= self.total() {
            return self.full_pattern();
        }
        self.render()
    }

    pub fn full_pattern(&self) -> String {
        self.full.iter().collect()
    }
}
