//! Static drift: a frozen pattern that slowly mutates a few glyphs at a time.

use rand::seq::index;
use rand::Rng;

/// Glyphs substituted into a drifting pattern.
pub const DRIFT_GLYPHS: [char; 7] = ['.', ':', ';', '+', '*', '-', '|'];

#[derive(Clone, Debug)]
pub struct StaticDrift {
    pattern: String,
    last_change: f64,
    interval_ms: f64,
    count: usize,
}

impl StaticDrift {
    /// `count` glyphs change at most once every `interval_ms`.
    pub fn new(interval_ms: f64, count: usize) -> Self {
        Self {
            pattern: String::new(),
            last_change: 0.0,
            interval_ms: interval_ms.max(0.0),
            count,
        }
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub fn has_pattern(&self) -> bool {
        !self.pattern.is_empty()
    }

    /// Adopt the most recently rendered pattern.
    pub fn set_pattern(&mut self, text: &str) {
        self.pattern.clear();
        self.pattern.push_str(text);
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
    }

    #[inline]
    pub fn last_change(&self) -> f64 {
        self.last_change
    }

    /// Restart the interval from `now_ms`.
    #[inline]
    pub fn mark(&mut self, now_ms: f64) {
        self.last_change = now_ms;
    }

    #[inline]
    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms - self.last_change >= self.interval_ms
    }

    /// Replace up to `count` distinct non-whitespace glyphs.
    ///
    /// Blank and separator positions are never touched. Returns the number
    /// of positions rewritten.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let mut chars: Vec<char> = self.pattern.chars().collect();
        let candidates: Vec<usize> = chars
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| i)
            .collect();

        let amount = self.count.min(candidates.len());
        if amount == 0 {
            return 0;
        }
        for pick in index::sample(rng, candidates.len(), amount).into_iter() {
            chars[candidates[pick]] = DRIFT_GLYPHS[rng.gen_range(0..DRIFT_GLYPHS.len())];
        }
        self.pattern = chars.into_iter().collect();
        amount
    }
}
