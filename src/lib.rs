//! # folio-ambience
//!
//! Client-side effects for a static site: animated ASCII backgrounds and a
//! single audio player that survives full-page navigations.
//!
//! This crate provides platform-agnostic state machines for:
//! - Generating procedural ASCII patterns (waves, noise, grid, circuit)
//! - Sizing a character grid to cover a text surface
//! - Animating patterns with eased fps transitions, progressive reveal and
//!   a slowly drifting static mode
//! - Playing audio with persisted state, autoplay-safe restarts and a
//!   snapshot hand-off across page swaps
//! - Switching between dark and light themes
//!
//! The core never reads a clock: hosts pass timestamps in and forward media
//! events, which keeps everything testable without a browser.
//!
//! ## Features
//!
//! - `web` - Browser bindings (DOM surfaces, `requestAnimationFrame` driver,
//!   `<audio>` element, Web Storage, JavaScript entry points)
//! - `toml` - Parse [`EffectsConfig`] from TOML
//!
//! ## Example
//!
//! ```rust
//! use folio_ambience::{Animator, AnimatorOptions, BufferSurface, Measurement, PatternKind, Tick};
//!
//! let options = AnimatorOptions {
//!     pattern: PatternKind::Waves,
//!     ..AnimatorOptions::default()
//! };
//! let surface = BufferSurface::new(Measurement::viewport(1024.0, 768.0));
//! let mut animator = Animator::new(Some(surface), options);
//!
//! animator.start(0.0);
//! let mut now = 0.0;
//! while animator.frame(now) != Tick::Rendered {
//!     now += 16.0;
//! }
//! assert!(!animator.surface().unwrap().text.is_empty());
//! ```

pub mod animator;
pub mod audio;
pub mod audio_store;
pub mod config;
mod drift;
pub mod fps;
pub mod media;
mod observer;
pub mod pattern;
pub mod playback;
mod reveal;
pub mod sizing;
pub mod storage;
mod surface;
pub mod theme;

#[cfg(feature = "web")]
pub mod web;

pub use animator::{Animator, AnimatorOptions, AnimatorState, AnimatorStatus, Debounce, Tick};
pub use audio::{format_time, AudioController, AudioOptions, Bind, PlayerState, StartOutcome, TrackCache};
pub use audio_store::AudioStateStore;
pub use config::{ConfigError, EffectsConfig};
pub use drift::{StaticDrift, DRIFT_GLYPHS};
pub use fps::{ease_out_cubic, FpsTransition, FrameRate, FPS_EPSILON};
pub use media::{MediaElement, MemoryMedia, PlayStart, PlayerView, RecordingView};
pub use observer::{ListenerId, Observers};
pub use pattern::{generate, PatternFrame, PatternKind, GLYPH_RAMP};
pub use playback::{PlaybackState, Track, TransitionSnapshot, DEFAULT_VOLUME};
pub use reveal::RevealState;
pub use sizing::{CellSizing, DimensionCalculator, GridSize};
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use surface::{BufferSurface, FontProbe, Measure, Measurement, TextSurface};
pub use theme::{Theme, ThemeController};
