//! Animator driving a pattern onto a text surface.

use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::drift::StaticDrift;
use crate::fps::{FrameRate, FPS_EPSILON};
use crate::observer::{ListenerId, Observers};
use crate::pattern::{self, PatternKind};
use crate::reveal::RevealState;
use crate::sizing::DimensionCalculator;
use crate::surface::TextSurface;

const STATIC_SETTLE_MS: f64 = 1000.0;
const BURST_FPS: f64 = 4.0;
const BURST_RISE_MS: f64 = 300.0;
const BURST_HOLD_MS: f64 = 400.0;
const BURST_DECAY_MS: f64 = 1200.0;

/// Animator configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimatorOptions {
    /// Pattern drawn by the animator
    pub pattern: PatternKind,
    /// Resting frame rate
    pub fps: f64,
    /// Default duration of fps transitions
    pub fps_transition_ms: f64,
    /// Start in static (drifting) mode
    pub static_mode: bool,
    /// Minimum time between two drift mutations
    pub static_change_interval_ms: f64,
    /// Glyphs rewritten per drift mutation
    pub static_change_count: usize,
    /// Fade the first pattern in on start
    pub progressive_reveal: bool,
    pub reveal_duration_ms: f64,
    /// Consecutive late callbacks skipped before forcing a render
    pub max_frame_skip: u32,
    /// Quiet period before a burst of resize signals is applied
    pub resize_debounce_ms: f64,
    /// Minimum time between two surface measurements
    pub resize_throttle_ms: f64,
    /// RNG seed for random pattern kinds, reveal order and drift
    pub seed: u64,
}

impl Default for AnimatorOptions {
    fn default() -> Self {
        Self {
            pattern: PatternKind::Circuit,
            fps: 8.0,
            fps_transition_ms: 1500.0,
            static_mode: false,
            static_change_interval_ms: 3000.0,
            static_change_count: 3,
            progressive_reveal: false,
            reveal_duration_ms: 1500.0,
            max_frame_skip: 2,
            resize_debounce_ms: 150.0,
            resize_throttle_ms: crate::sizing::DEFAULT_RESIZE_THROTTLE_MS,
            seed: 0,
        }
    }
}

/// Lifecycle state of the animator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimatorState {
    #[default]
    Idle,
    Running,
}

/// What a single frame callback did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Not running; do not reschedule
    Inactive,
    /// Too early for a new frame
    Waiting,
    /// Late callback skipped
    Skipped,
    /// Pattern regenerated and written
    Rendered,
    /// Static pattern mutated in place
    Drifted,
}

impl Tick {
    /// Whether the host should request another callback.
    #[inline]
    pub fn should_reschedule(self) -> bool {
        self != Tick::Inactive
    }
}

/// Broadcast to animator observers whenever a mode or target changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatorStatus {
    pub state: AnimatorState,
    pub pattern: PatternKind,
    pub target_fps: f64,
    pub static_mode: bool,
    pub revealing: bool,
}

/// Coalesces bursts of signals into one, after a quiet period.
#[derive(Clone, Debug)]
pub struct Debounce {
    delay_ms: f64,
    deadline: Option<f64>,
}

impl Debounce {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            deadline: None,
        }
    }

    /// Replace any pending deadline with `now_ms + delay`.
    #[inline]
    pub fn signal(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.delay_ms);
    }

    #[inline]
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed.
    pub fn fire_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Platform-agnostic animator for one text surface.
///
/// The animator does not own a clock. The host calls [`frame`](Self::frame)
/// from a display-synchronised callback with the current time and
/// reschedules while the returned [`Tick`] asks for it.
///
/// Each frame applies the fps transition first, then either a throttled
/// static drift (when settled at ~0 fps in static mode) or a regular
/// regenerate once the frame interval has elapsed.
///
/// ## Example
///
/// ```rust
/// use folio_ambience::{Animator, AnimatorOptions, BufferSurface, Measurement, Tick};
///
/// let surface = BufferSurface::new(Measurement::viewport(320.0, 200.0));
/// let mut animator = Animator::new(Some(surface), AnimatorOptions::default());
///
/// animator.start(0.0);
/// assert_eq!(animator.frame(50.0), Tick::Waiting);
/// assert_eq!(animator.frame(130.0), Tick::Rendered); // 8 fps => 125 ms
///
/// animator.stop();
/// assert_eq!(animator.frame(500.0), Tick::Inactive);
/// ```
pub struct Animator<S: TextSurface> {
    surface: Option<S>,
    options: AnimatorOptions,
    pattern: PatternKind,
    state: AnimatorState,
    origin: Option<f64>,
    last_frame_time: f64,
    frame_skip_count: u32,
    rate: FrameRate,
    dimensions: DimensionCalculator,
    reveal: Option<RevealState>,
    static_mode: bool,
    drift: StaticDrift,
    resize: Debounce,
    burst_decay_at: Option<f64>,
    rng: SmallRng,
    observers: Observers<AnimatorStatus>,
}

impl<S: TextSurface> Animator<S> {
    /// Create an animator. Without a surface every operation is a no-op.
    pub fn new(surface: Option<S>, options: AnimatorOptions) -> Self {
        Self {
            surface,
            pattern: options.pattern,
            state: AnimatorState::Idle,
            origin: None,
            last_frame_time: 0.0,
            frame_skip_count: 0,
            rate: FrameRate::new(options.fps),
            dimensions: DimensionCalculator::with_throttle(options.resize_throttle_ms),
            reveal: None,
            static_mode: options.static_mode,
            drift: StaticDrift::new(
                options.static_change_interval_ms,
                options.static_change_count,
            ),
            resize: Debounce::new(options.resize_debounce_ms),
            burst_decay_at: None,
            rng: SmallRng::seed_from_u64(options.seed),
            observers: Observers::new(),
            options,
        }
    }

    /// Whether the animator has no surface to draw on.
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.surface.is_none()
    }

    #[inline]
    pub fn state(&self) -> AnimatorState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == AnimatorState::Running
    }

    #[inline]
    pub fn options(&self) -> &AnimatorOptions {
        &self.options
    }

    #[inline]
    pub fn pattern(&self) -> PatternKind {
        self.pattern
    }

    #[inline]
    pub fn current_fps(&self) -> f64 {
        self.rate.current()
    }

    #[inline]
    pub fn target_fps(&self) -> f64 {
        self.rate.target()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.static_mode
    }

    #[inline]
    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    #[inline]
    pub fn reveal(&self) -> Option<&RevealState> {
        self.reveal.as_ref()
    }

    #[inline]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    #[inline]
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    #[inline]
    pub fn dimensions(&self) -> &DimensionCalculator {
        &self.dimensions
    }

    /// Milliseconds since the animator first started.
    #[inline]
    pub fn elapsed(&self, now_ms: f64) -> f64 {
        now_ms - self.origin.unwrap_or(now_ms)
    }

    pub fn status(&self) -> AnimatorStatus {
        AnimatorStatus {
            state: self.state,
            pattern: self.pattern,
            target_fps: self.rate.target(),
            static_mode: self.static_mode,
            revealing: self.reveal.is_some(),
        }
    }

    /// Register a status listener; it is called immediately.
    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&AnimatorStatus) + 'static,
    {
        let status = self.status();
        self.observers.subscribe(&status, callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn notify(&mut self) {
        let status = self.status();
        self.observers.notify(&status);
    }

    /// Start animating. Does nothing when inert or already running.
    pub fn start(&mut self, now_ms: f64) {
        if self.is_inert() || self.is_running() {
            return;
        }
        self.state = AnimatorState::Running;
        self.origin.get_or_insert(now_ms);
        self.last_frame_time = now_ms;
        self.frame_skip_count = 0;
        self.drift.mark(now_ms);

        if self.options.progressive_reveal {
            self.begin_reveal(now_ms);
        }
        debug!("animator started ({}, {} fps)", self.pattern, self.rate.current());
        self.notify();
    }

    /// Stop animating. Later frame callbacks leave the surface untouched.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state = AnimatorState::Idle;
        self.resize.cancel();
        self.burst_decay_at = None;
        self.notify();
    }

    /// Run one display-synchronised frame callback.
    pub fn frame(&mut self, now_ms: f64) -> Tick {
        if !self.is_running() || self.is_inert() {
            return Tick::Inactive;
        }

        if self.resize.fire_due(now_ms) {
            self.apply_resize(now_ms);
            return Tick::Rendered;
        }

        if let Some(at) = self.burst_decay_at {
            if now_ms >= at {
                self.burst_decay_at = None;
                self.transition_to_fps_over(0.0, BURST_DECAY_MS, now_ms);
            }
        }

        if self.rate.update(now_ms) {
            debug!("fps settled at {}", self.rate.current());
        }

        if self.static_mode && self.rate.current() <= FPS_EPSILON {
            return if self.drift_step(now_ms) {
                Tick::Drifted
            } else {
                Tick::Waiting
            };
        }

        let interval = self.rate.interval_ms();
        let delta = now_ms - self.last_frame_time;
        if !(delta >= interval) {
            return Tick::Waiting;
        }

        // Falling behind (e.g. a throttled background tab): skip a bounded
        // number of callbacks before rendering again.
        if delta > interval * 2.0 && self.frame_skip_count < self.options.max_frame_skip {
            self.frame_skip_count += 1;
            return Tick::Skipped;
        }
        self.frame_skip_count = 0;

        self.render(now_ms);
        self.last_frame_time = now_ms;
        Tick::Rendered
    }

    /// Move towards `target_fps` over the configured default duration.
    pub fn transition_to_fps(&mut self, target_fps: f64, now_ms: f64) {
        let duration = self.options.fps_transition_ms;
        self.transition_to_fps_over(target_fps, duration, now_ms);
    }

    /// Move towards `target_fps` over `duration_ms`, starting from the current fps.
    pub fn transition_to_fps_over(&mut self, target_fps: f64, duration_ms: f64, now_ms: f64) {
        let previous = self.rate.target();
        self.rate.transition_to(target_fps, duration_ms, now_ms);
        if previous != self.rate.target() {
            self.notify();
        }
    }

    /// Freeze the pattern and let it drift slowly.
    pub fn enable_static_mode(&mut self, now_ms: f64) {
        self.static_mode = true;
        if !self.drift.has_pattern() && !self.is_inert() {
            let text = self.generate_now(now_ms);
            self.write(&text);
            self.drift.set_pattern(&text);
        }
        self.transition_to_fps_over(0.0, STATIC_SETTLE_MS, now_ms);
        self.notify();
    }

    /// Leave static mode and return to the resting frame rate.
    pub fn disable_static_mode(&mut self, now_ms: f64) {
        if !self.static_mode {
            return;
        }
        self.static_mode = false;
        self.burst_decay_at = None;
        self.drift.clear();
        let fps = self.options.fps;
        self.transition_to_fps(fps, now_ms);
        self.notify();
    }

    /// A short flicker used as a navigation cue; only in static mode.
    ///
    /// Rises to a few fps quickly, then decays back to zero.
    pub fn trigger_page_transition(&mut self, now_ms: f64) {
        if !self.static_mode {
            return;
        }
        self.transition_to_fps_over(BURST_FPS, BURST_RISE_MS, now_ms);
        self.burst_decay_at = Some(now_ms + BURST_HOLD_MS);
    }

    /// Signal a resize; bursts are coalesced and applied on a later frame.
    pub fn resize(&mut self, now_ms: f64) {
        if self.is_inert() {
            return;
        }
        self.resize.signal(now_ms);
    }

    #[inline]
    pub fn resize_pending(&self) -> bool {
        self.resize.is_pending()
    }

    /// Switch pattern kinds, re-rendering right away when running.
    pub fn set_pattern(&mut self, kind: PatternKind, now_ms: f64) {
        if kind == self.pattern {
            return;
        }
        self.pattern = kind;
        if self.is_running() {
            if self.reveal.is_some() {
                self.rebuild_reveal(now_ms);
            }
            self.render(now_ms);
            self.last_frame_time = now_ms;
        }
        self.notify();
    }

    /// Replace the surface; the cached grid size is dropped.
    pub fn set_surface(&mut self, surface: Option<S>) {
        self.surface = surface;
        self.dimensions.invalidate();
        if self.surface.is_none() {
            self.stop();
        }
    }

    fn generate_now(&mut self, now_ms: f64) -> String {
        let Some(surface) = self.surface.as_ref() else {
            return String::new();
        };
        let size = self.dimensions.grid_size(surface, now_ms);
        let time = now_ms - self.origin.unwrap_or(now_ms);
        pattern::generate(self.pattern, size.width, size.height, time, &mut self.rng)
    }

    fn write(&mut self, text: &str) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_text(text);
        }
    }

    fn begin_reveal(&mut self, now_ms: f64) {
        let full = self.generate_now(now_ms);
        self.reveal = Some(RevealState::new(
            &full,
            now_ms,
            self.options.reveal_duration_ms,
            &mut self.rng,
        ));
    }

    fn rebuild_reveal(&mut self, now_ms: f64) {
        let full = self.generate_now(now_ms);
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.rebuild(&full, &mut self.rng);
        }
    }

    fn render(&mut self, now_ms: f64) {
        let full = self.generate_now(now_ms);
        let text = match self.reveal.as_mut() {
            Some(reveal) => {
                reveal.replace_pattern(&full, &mut self.rng);
                let text = reveal.render_at(now_ms);
                if reveal.is_complete(now_ms) {
                    self.reveal = None;
                    debug!("progressive reveal complete");
                    self.notify();
                }
                text
            }
            None => full,
        };

        self.write(&text);
        if self.static_mode {
            self.drift.set_pattern(&text);
        }
    }

    fn drift_step(&mut self, now_ms: f64) -> bool {
        if !self.drift.is_due(now_ms) {
            return false;
        }
        if !self.drift.has_pattern() {
            let text = self.generate_now(now_ms);
            self.write(&text);
            self.drift.set_pattern(&text);
        } else {
            self.drift.mutate(&mut self.rng);
            if let Some(surface) = self.surface.as_mut() {
                surface.set_text(self.drift.pattern());
            }
        }
        self.drift.mark(now_ms);
        true
    }

    fn apply_resize(&mut self, now_ms: f64) {
        self.dimensions.invalidate();
        if self.reveal.is_some() {
            self.rebuild_reveal(now_ms);
        }
        self.render(now_ms);
        self.last_frame_time = now_ms;
    }
}
