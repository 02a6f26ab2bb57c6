//! Persistent audio player controller.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::audio_store::AudioStateStore;
use crate::media::{MediaElement, PlayStart, PlayerView};
use crate::playback::{
    round_hundredths, round_tenths, PlaybackState, Track, TransitionSnapshot, DEFAULT_VOLUME,
};
use crate::storage::KeyValueStore;

/// Audio controller configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioOptions {
    /// Volume in `[0, 1]` when no volume was ever stored
    pub default_volume: f64,
    /// Minimum time between two progress redraws
    pub progress_throttle_ms: f64,
    /// Tracks remembered in memory, oldest evicted first
    pub track_cache_size: usize,
    /// Delay before retrying setup when the player elements are missing
    pub setup_retry_ms: u32,
    /// Settle delay between a page swap and restoring the player
    pub restore_delay_ms: u32,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            progress_throttle_ms: 250.0,
            track_cache_size: 2,
            setup_retry_ms: 50,
            restore_delay_ms: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayerState {
    #[default]
    NoTrack,
    Paused,
    Playing,
}

/// Result of an attempt to start playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Waiting on the host (a pending play request or the media ready signal)
    Deferred,
    /// Gave up; the player shows the needs-resume indicator
    NotStarted,
}

/// Result of binding the controller to its media element and view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bind {
    Bound,
    /// Elements missing; call again after this many milliseconds
    RetryAfter(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingStart {
    /// First play request of `load_track` is in flight
    Load,
    /// First request refused; retry once on the ready signal
    AwaitingReady,
    /// The single retry is in flight
    Retry,
    /// A user-initiated play request is in flight
    Manual,
}

/// Small insertion-ordered track cache.
#[derive(Clone, Debug)]
pub struct TrackCache {
    capacity: usize,
    entries: VecDeque<Track>,
}

impl TrackCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Remember `track`, evicting the oldest entry when full.
    pub fn insert(&mut self, track: Track) {
        if self.capacity == 0 {
            return;
        }
        self.entries.retain(|t| t.url != track.url);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(track);
    }

    pub fn get(&self, url: &str) -> Option<&Track> {
        self.entries.iter().find(|t| t.url == url)
    }

    #[inline]
    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Format seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_owned();
    }
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{mins}:{secs:02}")
}

/// The one audio player of the site.
///
/// Owns the media resource and its controls, and keeps the persisted
/// playback state in sync with every transition. The controller is
/// sans-IO: the host forwards media events (`on_ready`, `on_metadata`,
/// `on_time_update`, `on_ended`, `on_play_resolved`) and the navigation
/// lifecycle (`before_navigation`, `after_navigation`).
///
/// ## Example
///
/// ```rust
/// use folio_ambience::{
///     AudioController, AudioOptions, Bind, MemoryMedia, MemoryStore, PlayerState,
///     RecordingView, StartOutcome, Track,
/// };
///
/// let mut player = AudioController::new(MemoryStore::new(), MemoryStore::new(), AudioOptions::default());
/// assert_eq!(player.bind(Some(MemoryMedia::new()), Some(RecordingView::default())), Bind::Bound);
///
/// let outcome = player.load_track(Track::new("a.mp3", "T", "A"));
/// assert_eq!(outcome, StartOutcome::Started);
/// assert_eq!(player.state(), PlayerState::Playing);
///
/// player.close();
/// assert_eq!(player.state(), PlayerState::NoTrack);
/// ```
pub struct AudioController<M, V, K>
where
    M: MediaElement,
    V: PlayerView,
    K: KeyValueStore,
{
    media: Option<M>,
    view: Option<V>,
    store: AudioStateStore<K>,
    options: AudioOptions,
    track: Option<Track>,
    playing: bool,
    needs_resume: bool,
    cached_duration: f64,
    last_progress: Option<f64>,
    pending: Option<PendingStart>,
    /// The media reported ready while the first play request was in flight
    ready_seen: bool,
    restore: Option<TransitionSnapshot>,
    cache: TrackCache,
}

impl<M, V, K> AudioController<M, V, K>
where
    M: MediaElement,
    V: PlayerView,
    K: KeyValueStore,
{
    /// Create an unbound controller over long-lived and short-lived stores.
    pub fn new(local: K, session: K, options: AudioOptions) -> Self {
        Self {
            media: None,
            view: None,
            store: AudioStateStore::new(local, session),
            cache: TrackCache::new(options.track_cache_size),
            options,
            track: None,
            playing: false,
            needs_resume: false,
            cached_duration: 0.0,
            last_progress: None,
            pending: None,
            ready_seen: false,
            restore: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        match (&self.track, self.playing) {
            (None, _) => PlayerState::NoTrack,
            (Some(_), true) => PlayerState::Playing,
            (Some(_), false) => PlayerState::Paused,
        }
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.media.is_some() && self.view.is_some()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn needs_resume(&self) -> bool {
        self.needs_resume
    }

    #[inline]
    pub fn current_track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    /// Duration cached from metadata or the last snapshot (`0` when unknown).
    #[inline]
    pub fn cached_duration(&self) -> f64 {
        self.cached_duration
    }

    #[inline]
    pub fn options(&self) -> &AudioOptions {
        &self.options
    }

    #[inline]
    pub fn store(&self) -> &AudioStateStore<K> {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut AudioStateStore<K> {
        &mut self.store
    }

    #[inline]
    pub fn media(&self) -> Option<&M> {
        self.media.as_ref()
    }

    #[inline]
    pub fn media_mut(&mut self) -> Option<&mut M> {
        self.media.as_mut()
    }

    #[inline]
    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    #[inline]
    pub fn track_cache(&self) -> &TrackCache {
        &self.cache
    }

    /// Whether a restore is waiting for the media ready signal.
    #[inline]
    pub fn is_restoring(&self) -> bool {
        self.restore.is_some()
    }

    /// Current playback state, if a track is loaded.
    pub fn playback_state(&self) -> Option<PlaybackState> {
        let track = self.track.clone()?;
        let (current_time, volume) = match self.media.as_ref() {
            Some(media) => (media.current_time(), media.volume()),
            None => (0.0, self.options.default_volume),
        };
        Some(PlaybackState {
            track,
            current_time: round_tenths(current_time),
            is_playing: self.playing,
            volume: round_hundredths(volume),
        })
    }

    /// Attach the media element and view, then restore persisted state.
    ///
    /// A pending navigation snapshot wins over the long-lived state.
    pub fn bind(&mut self, media: Option<M>, view: Option<V>) -> Bind {
        let (Some(mut media), Some(mut view)) = (media, view) else {
            return Bind::RetryAfter(self.options.setup_retry_ms);
        };

        let percent = self
            .store
            .load_volume()
            .unwrap_or(self.options.default_volume * 100.0);
        media.set_volume(percent / 100.0);
        view.set_volume_slider(percent);
        view.set_playing(self.playing);
        view.set_needs_resume(self.needs_resume);

        self.media = Some(media);
        self.view = Some(view);

        match self.store.take_transition() {
            Some(snapshot) => self.restore_snapshot(snapshot),
            None => self.restore_state(),
        }
        Bind::Bound
    }

    /// Detach the media element and view.
    pub fn unbind(&mut self) -> (Option<M>, Option<V>) {
        self.pending = None;
        (self.media.take(), self.view.take())
    }

    /// Load `track` and try to start it right away.
    ///
    /// A refused start is retried once when the media reports it is ready;
    /// if that fails too the needs-resume indicator is shown.
    pub fn load_track(&mut self, track: Track) -> StartOutcome {
        if self.media.is_none() {
            warn!("cannot load {}: player is not bound", track.url);
            return StartOutcome::NotStarted;
        }

        let switching = self
            .track
            .as_ref()
            .is_some_and(|current| current.url != track.url);
        if switching {
            self.pause();
            if let Some(media) = self.media.as_mut() {
                media.set_current_time(0.0);
            }
        }

        self.pending = None;
        self.ready_seen = false;
        self.restore = None;
        self.needs_resume = false;
        self.cached_duration = 0.0;
        if let Some(view) = self.view.as_mut() {
            view.set_track_info(track.display_title(), track.display_artist());
            view.set_visible(true);
            view.set_needs_resume(false);
        }
        self.cache.insert(track.clone());

        let Some(media) = self.media.as_mut() else {
            return StartOutcome::NotStarted;
        };
        media.set_source(&track.url);
        self.track = Some(track);

        match media.request_play() {
            PlayStart::Started => {
                self.started();
                StartOutcome::Started
            }
            PlayStart::Rejected => {
                debug!("autoplay refused; waiting for the media to be ready");
                self.pending = Some(PendingStart::AwaitingReady);
                self.save_state();
                StartOutcome::Deferred
            }
            PlayStart::Pending => {
                self.pending = Some(PendingStart::Load);
                StartOutcome::Deferred
            }
        }
    }

    /// Resume or start the loaded track.
    pub fn play(&mut self) -> StartOutcome {
        if self.track.is_none() || self.media.is_none() {
            return StartOutcome::NotStarted;
        }
        // Pressed before the restored media was ready: seek first.
        if let Some(snapshot) = self.restore.take() {
            self.apply_snapshot_position(&snapshot);
        }
        let Some(media) = self.media.as_mut() else {
            return StartOutcome::NotStarted;
        };
        self.pending = None;

        match media.request_play() {
            PlayStart::Started => {
                self.started();
                StartOutcome::Started
            }
            PlayStart::Rejected => {
                warn!("playback failed to start");
                StartOutcome::NotStarted
            }
            PlayStart::Pending => {
                self.pending = Some(PendingStart::Manual);
                StartOutcome::Deferred
            }
        }
    }

    pub fn pause(&mut self) {
        let Some(media) = self.media.as_mut() else {
            return;
        };
        media.pause();
        self.pending = None;
        self.playing = false;
        if let Some(view) = self.view.as_mut() {
            view.set_playing(false);
        }
        self.save_state();
    }

    /// Pause when playing, otherwise play. `None` means it paused.
    pub fn toggle_play_pause(&mut self) -> Option<StartOutcome> {
        if self.playing {
            self.pause();
            None
        } else {
            Some(self.play())
        }
    }

    /// Host answer to an earlier [`PlayStart::Pending`].
    ///
    /// Returns the final outcome once one is known.
    pub fn on_play_resolved(&mut self, ok: bool) -> Option<StartOutcome> {
        match self.pending.take()? {
            PendingStart::Load if ok => {
                self.started();
                Some(StartOutcome::Started)
            }
            PendingStart::Load if self.ready_seen => {
                debug!("autoplay refused after the media was ready; retrying");
                self.ready_seen = false;
                self.retry_start()
            }
            PendingStart::Load => {
                debug!("autoplay refused; waiting for the media to be ready");
                self.pending = Some(PendingStart::AwaitingReady);
                self.save_state();
                None
            }
            PendingStart::Retry | PendingStart::Manual if ok => {
                self.started();
                Some(StartOutcome::Started)
            }
            PendingStart::Retry => {
                self.give_up();
                Some(StartOutcome::NotStarted)
            }
            PendingStart::Manual => {
                warn!("playback failed to start");
                Some(StartOutcome::NotStarted)
            }
            PendingStart::AwaitingReady => {
                self.pending = Some(PendingStart::AwaitingReady);
                None
            }
        }
    }

    /// The media can play: finish a pending restore or retry a refused start.
    pub fn on_ready(&mut self) -> Option<StartOutcome> {
        if let Some(snapshot) = self.restore.take() {
            self.apply_snapshot_position(&snapshot);
        }

        match self.pending {
            Some(PendingStart::AwaitingReady) => {}
            Some(PendingStart::Load) => {
                self.ready_seen = true;
                return None;
            }
            _ => return None,
        }
        self.pending = None;
        self.retry_start()
    }

    // Second and last automatic attempt to start playback.
    fn retry_start(&mut self) -> Option<StartOutcome> {
        let media = self.media.as_mut()?;
        match media.request_play() {
            PlayStart::Started => {
                self.started();
                Some(StartOutcome::Started)
            }
            PlayStart::Rejected => {
                self.give_up();
                Some(StartOutcome::NotStarted)
            }
            PlayStart::Pending => {
                self.pending = Some(PendingStart::Retry);
                None
            }
        }
    }

    /// Seek to `percent` of the track.
    pub fn seek_to(&mut self, percent: f64) {
        let cached = self.cached_duration;
        let Some(media) = self.media.as_mut() else {
            return;
        };
        let duration = if cached > 0.0 { cached } else { media.duration() };
        let time = percent / 100.0 * duration;
        if time.is_finite() {
            media.set_current_time(time);
        }
    }

    /// Set the volume from a percentage and remember it.
    pub fn set_volume(&mut self, percent: f64) {
        let Some(media) = self.media.as_mut() else {
            return;
        };
        media.set_volume(percent / 100.0);
        if let Err(err) = self.store.save_volume(percent) {
            warn!("volume not saved: {err}");
        }
    }

    /// Metadata loaded: cache and show the duration.
    pub fn on_metadata(&mut self) {
        let Some(duration) = self.media.as_ref().map(|m| m.duration()) else {
            return;
        };
        if duration.is_finite() && duration > 0.0 {
            self.cached_duration = duration;
            if let Some(view) = self.view.as_mut() {
                view.set_duration_text(&format_time(duration));
            }
        }
    }

    /// Position changed. Redraws progress at most once per throttle window.
    pub fn on_time_update(&mut self, now_ms: f64) -> bool {
        if let Some(last) = self.last_progress {
            if now_ms - last < self.options.progress_throttle_ms {
                return false;
            }
        }
        self.last_progress = Some(now_ms);

        let Some(media) = self.media.as_ref() else {
            return false;
        };
        let duration = if self.cached_duration > 0.0 {
            self.cached_duration
        } else {
            media.duration()
        };
        if !(duration.is_finite() && duration > 0.0) {
            return false;
        }
        let current = media.current_time();
        if let Some(view) = self.view.as_mut() {
            view.set_progress(current / duration * 100.0, &format_time(current));
        }
        true
    }

    pub fn on_ended(&mut self) {
        self.playing = false;
        if let Some(view) = self.view.as_mut() {
            view.set_playing(false);
        }
        self.save_state();
    }

    /// Stop, hide the player and forget the track and its persisted state.
    pub fn close(&mut self) {
        if let Some(media) = self.media.as_mut() {
            media.pause();
            media.set_source("");
            media.set_current_time(0.0);
        }
        if let Some(view) = self.view.as_mut() {
            view.set_visible(false);
            view.set_playing(false);
            view.set_needs_resume(false);
        }

        self.track = None;
        self.playing = false;
        self.needs_resume = false;
        self.cached_duration = 0.0;
        self.last_progress = None;
        self.pending = None;
        self.ready_seen = false;
        self.restore = None;
        self.store.clear();
        self.cache.clear();
        debug!("player closed");
    }

    /// Snapshot the player before a full-page navigation and silence it.
    ///
    /// Returns `false` when there was nothing to save.
    pub fn before_navigation(&mut self) -> bool {
        let (Some(track), Some(media)) = (self.track.as_ref(), self.media.as_mut()) else {
            return false;
        };

        let duration = if self.cached_duration > 0.0 {
            self.cached_duration
        } else {
            media.duration()
        };
        let snapshot = TransitionSnapshot {
            track: track.clone(),
            current_time: round_tenths(media.current_time()),
            duration: round_tenths(duration),
            is_playing: self.playing,
            volume: round_hundredths(media.volume()),
            visible: self.view.as_ref().is_some_and(|v| v.is_visible()),
            was_playing: !media.is_paused(),
        };

        if !media.is_paused() {
            media.pause();
        }
        self.pending = None;

        if let Err(err) = self.store.save_transition(&snapshot) {
            warn!("transition snapshot not saved: {err}");
        }
        true
    }

    /// Rebind to the freshly rendered page and restore the snapshot.
    ///
    /// Playback never resumes by itself: when the player was playing the
    /// needs-resume indicator asks for one explicit gesture.
    pub fn after_navigation(&mut self, media: Option<M>, view: Option<V>) -> Bind {
        self.pending = None;
        self.ready_seen = false;
        self.bind(media, view)
    }

    fn restore_snapshot(&mut self, snapshot: TransitionSnapshot) {
        self.playing = false;
        self.cached_duration = snapshot.duration;
        if let Some(view) = self.view.as_mut() {
            view.set_track_info(snapshot.track.display_title(), snapshot.track.display_artist());
            if snapshot.visible {
                view.set_visible(true);
            }
            view.set_playing(false);
        }
        if let Some(media) = self.media.as_mut() {
            media.set_source(&snapshot.track.url);
        }
        self.cache.insert(snapshot.track.clone());
        self.track = Some(snapshot.track.clone());
        debug!("restoring {} after navigation", snapshot.track.url);
        self.restore = Some(snapshot);
    }

    fn apply_snapshot_position(&mut self, snapshot: &TransitionSnapshot) {
        if let Some(media) = self.media.as_mut() {
            media.set_current_time(snapshot.current_time);
            media.set_volume(snapshot.volume);
        }
        if let Some(view) = self.view.as_mut() {
            view.set_volume_slider(snapshot.volume * 100.0);
        }
        // A start already requested by the user owns the play indicators.
        if self.playing || self.pending.is_some() {
            return;
        }
        self.needs_resume = snapshot.should_offer_resume();
        if let Some(view) = self.view.as_mut() {
            view.set_playing(false);
            view.set_needs_resume(self.needs_resume);
        }
    }

    fn restore_state(&mut self) {
        let Some(state) = self.store.load_playback() else {
            return;
        };
        if let Some(media) = self.media.as_mut() {
            media.set_source(&state.track.url);
            media.set_current_time(state.current_time);
        }
        self.playing = false;
        self.needs_resume = state.is_playing;
        if let Some(view) = self.view.as_mut() {
            view.set_track_info(state.track.display_title(), state.track.display_artist());
            view.set_visible(true);
            view.set_playing(false);
            view.set_needs_resume(self.needs_resume);
        }
        self.cache.insert(state.track.clone());
        self.track = Some(state.track);
    }

    fn started(&mut self) {
        self.playing = true;
        self.needs_resume = false;
        if let Some(view) = self.view.as_mut() {
            view.set_playing(true);
            view.set_needs_resume(false);
        }
        self.save_state();
    }

    fn give_up(&mut self) {
        warn!("playback could not start; waiting for the user");
        self.playing = false;
        self.needs_resume = true;
        if let Some(view) = self.view.as_mut() {
            view.set_playing(false);
            view.set_needs_resume(true);
        }
        self.save_state();
    }

    fn save_state(&mut self) {
        let Some(state) = self.playback_state() else {
            return;
        };
        if let Err(err) = self.store.save_playback(&state) {
            warn!("playback state not saved: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MemoryMedia, RecordingView};
    use crate::storage::{keys, MemoryStore};

    type Player = AudioController<MemoryMedia, RecordingView, MemoryStore>;

    fn bound(media: MemoryMedia) -> Player {
        let mut player = Player::new(MemoryStore::new(), MemoryStore::new(), AudioOptions::default());
        assert_eq!(player.bind(Some(media), Some(RecordingView::default())), Bind::Bound);
        player
    }

    fn track() -> Track {
        Track::new("a.mp3", "T", "A")
    }

    fn view(player: &Player) -> RecordingView {
        player.view().cloned().unwrap_or_default()
    }

    #[test]
    fn test_bind_retries_when_elements_missing() {
        let mut player = Player::new(MemoryStore::new(), MemoryStore::new(), AudioOptions::default());
        assert_eq!(player.bind(None, Some(RecordingView::default())), Bind::RetryAfter(50));
        assert_eq!(player.bind(Some(MemoryMedia::new()), None), Bind::RetryAfter(50));
        assert!(!player.is_bound());
        assert_eq!(player.load_track(track()), StartOutcome::NotStarted);
    }

    #[test]
    fn test_bind_applies_default_volume() {
        let player = bound(MemoryMedia::new());
        assert_eq!(player.media().map(|m| m.volume), Some(0.7));
        assert_eq!(view(&player).volume_slider, Some(70.0));
    }

    #[test]
    fn test_load_and_play_persists_state() {
        let mut player = bound(MemoryMedia::new());
        assert_eq!(player.load_track(track()), StartOutcome::Started);
        assert_eq!(player.play(), StartOutcome::Started);

        let v = view(&player);
        assert_eq!((v.title.as_str(), v.artist.as_str()), ("T", "A"));
        assert!(v.visible && v.playing && !v.needs_resume);

        let saved = player.store().load_playback();
        assert_eq!(
            saved,
            Some(PlaybackState {
                track: track(),
                current_time: 0.0,
                is_playing: true,
                volume: 0.7,
            })
        );
    }

    #[test]
    fn test_rejected_start_retries_once_on_ready() {
        let media = MemoryMedia::new().respond_with([PlayStart::Rejected, PlayStart::Started]);
        let mut player = bound(media);
        assert_eq!(player.load_track(track()), StartOutcome::Deferred);
        assert_eq!(player.state(), PlayerState::Paused);

        assert_eq!(player.on_ready(), Some(StartOutcome::Started));
        assert_eq!(player.state(), PlayerState::Playing);
        // Later ready signals do not request again.
        assert_eq!(player.on_ready(), None);
        assert_eq!(player.media().map(|m| m.play_requests), Some(2));
    }

    #[test]
    fn test_second_rejection_shows_resume_indicator() {
        let media = MemoryMedia::new().respond_with([PlayStart::Rejected, PlayStart::Rejected]);
        let mut player = bound(media);
        assert_eq!(player.load_track(track()), StartOutcome::Deferred);
        assert_eq!(player.on_ready(), Some(StartOutcome::NotStarted));

        assert!(player.needs_resume());
        assert!(view(&player).needs_resume);
        assert!(!player.is_playing());

        assert_eq!(player.toggle_play_pause(), Some(StartOutcome::Started));
        assert!(!view(&player).needs_resume);
    }

    #[test]
    fn test_async_start_resolution() {
        let media = MemoryMedia::new().respond_with([PlayStart::Pending, PlayStart::Pending]);
        let mut player = bound(media);
        assert_eq!(player.load_track(track()), StartOutcome::Deferred);
        assert_eq!(player.on_play_resolved(false), None);

        assert_eq!(player.on_ready(), None);
        assert_eq!(player.on_play_resolved(false), Some(StartOutcome::NotStarted));
        assert!(player.needs_resume());
        assert_eq!(player.on_play_resolved(true), None);
    }

    #[test]
    fn test_ready_before_refusal_retries_immediately() {
        let media = MemoryMedia::new().respond_with([PlayStart::Pending, PlayStart::Rejected]);
        let mut player = bound(media);
        assert_eq!(player.load_track(track()), StartOutcome::Deferred);
        assert_eq!(player.on_ready(), None);

        assert_eq!(player.on_play_resolved(false), Some(StartOutcome::NotStarted));
        assert!(player.needs_resume());
        assert!(view(&player).needs_resume);
        assert_eq!(player.media().map(|m| m.play_requests), Some(2));
    }

    #[test]
    fn test_ready_before_refusal_can_still_start() {
        let media = MemoryMedia::new().respond_with([PlayStart::Pending]);
        let mut player = bound(media);
        player.load_track(track());
        player.on_ready();

        assert_eq!(player.on_play_resolved(false), Some(StartOutcome::Started));
        assert_eq!(player.state(), PlayerState::Playing);
        assert!(!player.needs_resume());
    }

    #[test]
    fn test_pause_discards_pending_start() {
        let media = MemoryMedia::new().respond_with([PlayStart::Pending]);
        let mut player = bound(media);
        player.load_track(track());
        player.pause();
        assert_eq!(player.on_play_resolved(false), None);
        assert_eq!(player.on_ready(), None);
        assert_eq!(player.state(), PlayerState::Paused);
    }

    #[test]
    fn test_switching_tracks_resets_position() {
        let mut player = bound(MemoryMedia::new());
        player.load_track(track());
        if let Some(media) = player.media_mut() {
            media.current_time = 90.0;
        }
        player.load_track(Track::new("b.mp3", "U", "B"));
        let media = player.media().cloned().unwrap_or_default();
        assert_eq!(media.source, "b.mp3");
        assert_eq!(media.current_time, 0.0);
        assert_eq!(player.current_track().map(|t| t.url.as_str()), Some("b.mp3"));
    }

    #[test]
    fn test_close_clears_everything() {
        let mut player = bound(MemoryMedia::new());
        player.load_track(track());
        player.before_navigation();
        player.close();

        assert_eq!(player.state(), PlayerState::NoTrack);
        assert!(player.media().is_some_and(|m| m.paused && m.source.is_empty()));
        assert!(!player.store().local().contains(keys::PLAYBACK));
        assert!(!player.store().session().contains(keys::TRANSITION));
        assert!(player.track_cache().is_empty());
        assert!(!view(&player).visible);
    }

    #[test]
    fn test_navigation_round_trip() {
        let mut player = bound(MemoryMedia::new());
        player.load_track(track());
        player.set_volume(55.0);
        if let Some(media) = player.media_mut() {
            media.current_time = 42.37;
            media.duration = 180.0;
        }
        player.on_metadata();

        assert!(player.before_navigation());
        assert!(player.media().is_some_and(|m| m.paused));
        assert!(player.store().has_transition());

        let bind = player.after_navigation(Some(MemoryMedia::new()), Some(RecordingView::default()));
        assert_eq!(bind, Bind::Bound);
        assert!(!player.store().has_transition());
        assert_eq!(player.media().map(|m| m.source.as_str()), Some("a.mp3"));
        assert_eq!(player.cached_duration(), 180.0);
        assert!(player.is_restoring());

        assert_eq!(player.on_ready(), None);
        let media = player.media().cloned().unwrap_or_default();
        assert!((media.current_time - 42.37).abs() <= 0.1);
        assert_eq!(media.volume, 0.55);
        assert_eq!(player.current_track(), Some(&track()));

        // Never resumes silently.
        assert!(media.paused);
        assert!(player.needs_resume());
        let v = view(&player);
        assert!(v.visible && v.needs_resume && !v.playing);
    }

    #[test]
    fn test_play_before_restored_media_is_ready() {
        let mut player = bound(MemoryMedia::new());
        player.load_track(track());
        if let Some(media) = player.media_mut() {
            media.current_time = 42.0;
        }
        player.before_navigation();
        player.after_navigation(Some(MemoryMedia::new()), Some(RecordingView::default()));

        assert_eq!(player.play(), StartOutcome::Started);
        assert_eq!(player.on_ready(), None);

        let media = player.media().cloned().unwrap_or_default();
        assert!(!media.paused);
        assert_eq!(media.current_time, 42.0);
        assert_eq!(player.state(), PlayerState::Playing);
        assert!(!player.needs_resume());
        let v = view(&player);
        assert!(v.playing && !v.needs_resume);

        // One click stops it.
        assert_eq!(player.toggle_play_pause(), None);
        assert!(player.media().is_some_and(|m| m.paused));
    }

    #[test]
    fn test_paused_track_restores_without_indicator() {
        let mut player = bound(MemoryMedia::new());
        player.load_track(track());
        player.pause();
        player.before_navigation();
        player.after_navigation(Some(MemoryMedia::new()), Some(RecordingView::default()));
        player.on_ready();
        assert!(!player.needs_resume());
        assert_eq!(player.state(), PlayerState::Paused);
    }

    #[test]
    fn test_cold_start_restores_long_lived_state() {
        let local = MemoryStore::new()
            .with_entry(keys::VOLUME, "30")
            .with_entry(
                keys::PLAYBACK,
                r#"{"track":{"url":"c.mp3","title":"C"},"currentTime":12.5,"isPlaying":true,"volume":0.3}"#,
            );
        let mut player = Player::new(local, MemoryStore::new(), AudioOptions::default());
        player.bind(Some(MemoryMedia::new()), Some(RecordingView::default()));

        let media = player.media().cloned().unwrap_or_default();
        assert_eq!(media.source, "c.mp3");
        assert_eq!(media.current_time, 12.5);
        assert_eq!(media.volume, 0.3);
        assert_eq!(player.state(), PlayerState::Paused);
        assert!(player.needs_resume());
        let v = view(&player);
        assert_eq!((v.title.as_str(), v.artist.as_str()), ("C", ""));
        assert_eq!(v.volume_slider, Some(30.0));
    }

    #[test]
    fn test_corrupt_state_does_not_block_setup() {
        let local = MemoryStore::new().with_entry(keys::PLAYBACK, "garbage");
        let session = MemoryStore::new().with_entry(keys::TRANSITION, "{}");
        let mut player = Player::new(local, session, AudioOptions::default());
        assert_eq!(
            player.bind(Some(MemoryMedia::new()), Some(RecordingView::default())),
            Bind::Bound
        );
        assert_eq!(player.state(), PlayerState::NoTrack);
        assert!(!player.store().has_transition());
    }

    #[test]
    fn test_seek_and_progress() {
        let mut player = bound(MemoryMedia::new());
        player.load_track(track());
        if let Some(media) = player.media_mut() {
            media.duration = 185.0;
        }
        player.on_metadata();
        assert_eq!(view(&player).duration, "3:05");

        player.seek_to(50.0);
        assert_eq!(player.media().map(|m| m.current_time), Some(92.5));

        assert!(player.on_time_update(1_000.0));
        let v = view(&player);
        assert_eq!(v.progress, 50.0);
        assert_eq!(v.current_time, "1:32");

        assert!(!player.on_time_update(1_100.0));
        assert!(player.on_time_update(1_250.0));
    }

    #[test]
    fn test_ended_persists_paused_state() {
        let mut player = bound(MemoryMedia::new());
        player.load_track(track());
        player.on_ended();
        assert_eq!(player.state(), PlayerState::Paused);
        assert_eq!(player.store().load_playback().map(|s| s.is_playing), Some(false));
    }

    #[test]
    fn test_track_cache_evicts_oldest() {
        let mut cache = TrackCache::new(2);
        cache.insert(Track::new("a", "", ""));
        cache.insert(Track::new("b", "", ""));
        cache.insert(Track::new("c", "", ""));
        assert!(!cache.contains("a"));
        assert!(cache.contains("b") && cache.contains("c"));

        cache.insert(Track::new("b", "B", ""));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b").map(|t| t.display_title()), Some("B"));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }
}
