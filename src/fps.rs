//! Frame-rate transitions.

/// Frame rates at or below this are treated as "stopped".
pub const FPS_EPSILON: f64 = 0.1;

/// Ease-out cubic curve over `[0, 1]`.
#[inline]
pub fn ease_out_cubic(progress: f64) -> f64 {
    1.0 - (1.0 - progress).powi(3)
}

/// Milliseconds between frames at `fps`; infinite once fps is near zero.
#[inline]
pub fn frame_interval_ms(fps: f64) -> f64 {
    if fps > FPS_EPSILON {
        1000.0 / fps
    } else {
        f64::INFINITY
    }
}

/// An eased interpolation from one frame rate to another.
///
/// ## Example
///
/// ```rust
/// use folio_ambience::FpsTransition;
///
/// let t = FpsTransition::new(0.0, 10.0, 0.0, 1000.0);
/// assert_eq!(t.sample(0.0), 0.0);
/// assert_eq!(t.sample(1000.0), 10.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsTransition {
    pub start_fps: f64,
    pub target_fps: f64,
    pub start_time: f64,
    /// Always positive
    pub duration: f64,
}

impl FpsTransition {
    pub fn new(start_fps: f64, target_fps: f64, start_time: f64, duration: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            1.0
        };
        Self {
            start_fps: start_fps.max(0.0),
            target_fps: target_fps.max(0.0),
            start_time,
            duration,
        }
    }

    /// Linear progress through the transition, clamped to `[0, 1]`.
    #[inline]
    pub fn progress(&self, now_ms: f64) -> f64 {
        ((now_ms - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    /// Frame rate at `now_ms`; exactly the target once finished.
    pub fn sample(&self, now_ms: f64) -> f64 {
        let progress = self.progress(now_ms);
        if progress >= 1.0 {
            return self.target_fps;
        }
        let eased = ease_out_cubic(progress);
        let lo = self.start_fps.min(self.target_fps);
        let hi = self.start_fps.max(self.target_fps);
        (self.start_fps + (self.target_fps - self.start_fps) * eased).clamp(lo, hi)
    }
}

/// Current frame rate plus an optional in-flight transition.
#[derive(Clone, Debug)]
pub struct FrameRate {
    current: f64,
    target: f64,
    transition: Option<FpsTransition>,
}

impl FrameRate {
    pub fn new(fps: f64) -> Self {
        let fps = fps.max(0.0);
        Self {
            current: fps,
            target: fps,
            transition: None,
        }
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    #[inline]
    pub fn transition(&self) -> Option<&FpsTransition> {
        self.transition.as_ref()
    }

    /// Start moving towards `target` from wherever the rate currently is.
    ///
    /// Transitions compound: a new request replaces the old one and starts
    /// from the current interpolated value. Changes smaller than
    /// [`FPS_EPSILON`] snap immediately.
    pub fn transition_to(&mut self, target: f64, duration_ms: f64, now_ms: f64) {
        let target = target.max(0.0);
        self.target = target;
        if (self.current - target).abs() < FPS_EPSILON {
            self.current = target;
            self.transition = None;
            return;
        }
        self.transition = Some(FpsTransition::new(self.current, target, now_ms, duration_ms));
    }

    /// Jump straight to `fps`, cancelling any transition.
    pub fn set(&mut self, fps: f64) {
        let fps = fps.max(0.0);
        self.current = fps;
        self.target = fps;
        self.transition = None;
    }

    /// Advance the transition. Returns `true` when it finished on this call.
    pub fn update(&mut self, now_ms: f64) -> bool {
        let Some(transition) = self.transition else {
            return false;
        };
        self.current = transition.sample(now_ms);
        if transition.is_finished(now_ms) {
            self.current = transition.target_fps;
            self.transition = None;
            return true;
        }
        false
    }

    #[inline]
    pub fn interval_ms(&self) -> f64 {
        frame_interval_ms(self.current)
    }
}
