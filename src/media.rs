//! Seams between the audio controller and the host's media element and UI.

use std::collections::VecDeque;

/// Immediate answer to a play request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayStart {
    /// Playback started synchronously
    Started,
    /// The host refused (e.g. autoplay policy)
    Rejected,
    /// The host will answer later via `AudioController::on_play_resolved`
    Pending,
}

/// The single playable media resource.
pub trait MediaElement {
    fn set_source(&mut self, url: &str);
    fn request_play(&mut self) -> PlayStart;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Position in seconds
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Duration in seconds; NaN while unknown
    fn duration(&self) -> f64;
    /// Volume in `[0, 1]`
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
}

/// The player's visible controls. Any of them may be absent on the page,
/// so implementations ignore what they cannot show.
pub trait PlayerView {
    fn set_track_info(&mut self, title: &str, artist: &str);
    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;
    /// Toggle play/pause icons
    fn set_playing(&mut self, playing: bool);
    fn set_needs_resume(&mut self, needs_resume: bool);
    fn set_progress(&mut self, percent: f64, current_time: &str);
    fn set_duration_text(&mut self, text: &str);
    fn set_volume_slider(&mut self, percent: f64);
}

/// Headless media element.
///
/// Play requests are answered from `play_responses` (front first) and
/// default to [`PlayStart::Started`] once the queue is empty.
#[derive(Clone, Debug)]
pub struct MemoryMedia {
    pub source: String,
    pub paused: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub play_responses: VecDeque<PlayStart>,
    pub play_requests: usize,
}

impl Default for MemoryMedia {
    fn default() -> Self {
        Self {
            source: String::new(),
            paused: true,
            current_time: 0.0,
            duration: f64::NAN,
            volume: 1.0,
            play_responses: VecDeque::new(),
            play_requests: 0,
        }
    }
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue answers for upcoming play requests.
    pub fn respond_with(mut self, responses: impl IntoIterator<Item = PlayStart>) -> Self {
        self.play_responses.extend(responses);
        self
    }
}

impl MediaElement for MemoryMedia {
    fn set_source(&mut self, url: &str) {
        self.source = url.to_owned();
        self.paused = true;
        self.duration = f64::NAN;
    }

    fn request_play(&mut self) -> PlayStart {
        self.play_requests += 1;
        let response = self.play_responses.pop_front().unwrap_or(PlayStart::Started);
        if response == PlayStart::Started {
            self.paused = false;
        }
        response
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }
}

/// Headless view recording the last value shown by every control.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingView {
    pub title: String,
    pub artist: String,
    pub visible: bool,
    pub playing: bool,
    pub needs_resume: bool,
    pub progress: f64,
    pub current_time: String,
    pub duration: String,
    pub volume_slider: Option<f64>,
}

impl PlayerView for RecordingView {
    fn set_track_info(&mut self, title: &str, artist: &str) {
        self.title = title.to_owned();
        self.artist = artist.to_owned();
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    fn set_needs_resume(&mut self, needs_resume: bool) {
        self.needs_resume = needs_resume;
    }

    fn set_progress(&mut self, percent: f64, current_time: &str) {
        self.progress = percent;
        self.current_time = current_time.to_owned();
    }

    fn set_duration_text(&mut self, text: &str) {
        self.duration = text.to_owned();
    }

    fn set_volume_slider(&mut self, percent: f64) {
        self.volume_slider = Some(percent);
    }
}
