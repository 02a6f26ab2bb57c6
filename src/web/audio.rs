//! The global `<audio>` player bound to the page.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlAudioElement, HtmlElement, HtmlInputElement,
};

use super::{now_ms, sleep_ms, BrowserStorage, Listener};
use crate::audio::{AudioController, AudioOptions, Bind, StartOutcome};
use crate::media::{MediaElement, PlayStart, PlayerView};
use crate::playback::Track;

const PLAYER_ID: &str = "global-audio-player";
const AUDIO_ID: &str = "global-audio";
const PLAY_PAUSE_ID: &str = "play-pause-btn";
const PROGRESS_ID: &str = "progress-slider";
const VOLUME_ID: &str = "volume-slider";
const CLOSE_ID: &str = "close-player-btn";
const RESUME_HINT: &str = "Click to resume playback";

/// The page's `<audio id="global-audio">` element.
pub struct DomMedia {
    audio: HtmlAudioElement,
    pending_play: Option<js_sys::Promise>,
}

impl DomMedia {
    pub fn new(audio: HtmlAudioElement) -> Self {
        Self {
            audio,
            pending_play: None,
        }
    }

    pub fn find(document: &Document) -> Option<Self> {
        document
            .get_element_by_id(AUDIO_ID)?
            .dyn_into::<HtmlAudioElement>()
            .ok()
            .map(Self::new)
    }

    #[inline]
    pub fn element(&self) -> &HtmlAudioElement {
        &self.audio
    }

    /// The promise of the last play request, to await outside any borrow.
    pub fn take_pending_play(&mut self) -> Option<js_sys::Promise> {
        self.pending_play.take()
    }
}

impl MediaElement for DomMedia {
    fn set_source(&mut self, url: &str) {
        self.audio.set_src(url);
    }

    fn request_play(&mut self) -> PlayStart {
        match self.audio.play() {
            Ok(promise) => {
                self.pending_play = Some(promise);
                PlayStart::Pending
            }
            Err(_) => PlayStart::Rejected,
        }
    }

    fn pause(&mut self) {
        let _ = self.audio.pause();
    }

    fn is_paused(&self) -> bool {
        self.audio.paused()
    }

    fn current_time(&self) -> f64 {
        self.audio.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.audio.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.audio.duration()
    }

    fn volume(&self) -> f64 {
        self.audio.volume()
    }

    fn set_volume(&mut self, volume: f64) {
        // Out-of-range volumes throw in the browser.
        self.audio.set_volume(volume.clamp(0.0, 1.0));
    }
}

/// The player controls rendered by the page. Only the player container is
/// required; any other control may be missing.
pub struct DomPlayerView {
    player: Element,
    play_pause: Option<HtmlElement>,
    progress: Option<HtmlInputElement>,
    volume: Option<HtmlInputElement>,
    title: Option<Element>,
    artist: Option<Element>,
    current_time: Option<Element>,
    duration: Option<Element>,
    play_icon: Option<HtmlElement>,
    pause_icon: Option<HtmlElement>,
}

impl DomPlayerView {
    pub fn find(document: &Document) -> Option<Self> {
        let player = document.get_element_by_id(PLAYER_ID)?;
        let html = |id: &str| {
            document
                .get_element_by_id(id)
                .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        };
        let input = |id: &str| {
            document
                .get_element_by_id(id)
                .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
        };
        let icon = |selector: &str| {
            document
                .query_selector(selector)
                .ok()
                .flatten()
                .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        };

        Some(Self {
            play_pause: html(PLAY_PAUSE_ID),
            progress: input(PROGRESS_ID),
            volume: input(VOLUME_ID),
            title: document.get_element_by_id("current-track-title"),
            artist: document.get_element_by_id("current-track-artist"),
            current_time: document.get_element_by_id("current-time"),
            duration: document.get_element_by_id("duration"),
            play_icon: icon(".play-icon"),
            pause_icon: icon(".pause-icon"),
            player,
        })
    }

    fn body(&self) -> Option<HtmlElement> {
        self.player.owner_document()?.body()
    }
}

impl PlayerView for DomPlayerView {
    fn set_track_info(&mut self, title: &str, artist: &str) {
        if let Some(el) = &self.title {
            el.set_text_content(Some(title));
        }
        if let Some(el) = &self.artist {
            el.set_text_content(Some(artist));
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if visible == self.is_visible() {
            return;
        }
        let classes = self.player.class_list();
        if visible {
            let _ = classes.remove_1("hidden");
            let height = self
                .player
                .dyn_ref::<HtmlElement>()
                .map(|p| p.offset_height())
                .unwrap_or(0);
            if let Some(body) = self.body() {
                let _ = body.style().set_property("padding-top", &format!("{height}px"));
            }
        } else {
            let _ = classes.add_1("hidden");
            if let Some(body) = self.body() {
                let _ = body.style().set_property("padding-top", "0");
            }
        }
    }

    fn is_visible(&self) -> bool {
        !self.player.class_list().contains("hidden")
    }

    fn set_playing(&mut self, playing: bool) {
        let (shown, hidden) = if playing {
            (&self.pause_icon, &self.play_icon)
        } else {
            (&self.play_icon, &self.pause_icon)
        };
        if let Some(icon) = shown {
            let _ = icon.style().set_property("display", "block");
        }
        if let Some(icon) = hidden {
            let _ = icon.style().set_property("display", "none");
        }
    }

    fn set_needs_resume(&mut self, needs_resume: bool) {
        let Some(button) = &self.play_pause else {
            return;
        };
        if needs_resume {
            let _ = button.class_list().add_1("needs-resume");
            button.set_title(RESUME_HINT);
        } else {
            let _ = button.class_list().remove_1("needs-resume");
            button.set_title("");
        }
    }

    fn set_progress(&mut self, percent: f64, current_time: &str) {
        if let Some(slider) = &self.progress {
            slider.set_value_as_number(percent);
        }
        if let Some(el) = &self.current_time {
            el.set_text_content(Some(current_time));
        }
    }

    fn set_duration_text(&mut self, text: &str) {
        if let Some(el) = &self.duration {
            el.set_text_content(Some(text));
        }
    }

    fn set_volume_slider(&mut self, percent: f64) {
        if let Some(slider) = &self.volume {
            slider.set_value_as_number(percent);
        }
    }
}

type WebController = AudioController<DomMedia, DomPlayerView, BrowserStorage>;

struct GlobalInner {
    controller: RefCell<WebController>,
    /// Listeners on the current page's elements, replaced on every bind
    elements: RefCell<Vec<Listener>>,
    /// Navigation listeners on the document, kept until teardown
    document: RefCell<Vec<Listener>>,
}

/// The site-wide audio player bound to the live DOM.
///
/// Created once with [`GlobalAudio::init`] and released with
/// [`GlobalAudio::teardown`]. Survives full-page swaps by snapshotting
/// before `astro:before-swap` and rebinding after `astro:after-swap`.
#[derive(Clone)]
pub struct GlobalAudio {
    inner: Rc<GlobalInner>,
}

impl GlobalAudio {
    pub fn init(options: AudioOptions) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("No document available")?;

        let controller = AudioController::new(BrowserStorage::local(), BrowserStorage::session(), options);
        let inner = Rc::new(GlobalInner {
            controller: RefCell::new(controller),
            elements: RefCell::new(Vec::new()),
            document: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&inner);
        let before = Listener::new(&document, "astro:before-swap", move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.elements.borrow_mut().clear();
                inner.controller.borrow_mut().before_navigation();
            }
        })?;

        let weak = Rc::downgrade(&inner);
        let after = Listener::new(&document, "astro:after-swap", move |_| {
            let weak = weak.clone();
            spawn_local(async move {
                let delay = match weak.upgrade() {
                    Some(inner) => inner.controller.borrow().options().restore_delay_ms,
                    None => return,
                };
                sleep_ms(delay as i32).await;
                setup(weak, true).await;
            });
        })?;
        inner.document.borrow_mut().extend([before, after]);

        spawn_local(setup(Rc::downgrade(&inner), false));
        Ok(Self { inner })
    }

    /// Remove every listener and detach from the DOM.
    pub fn teardown(self) {
        self.inner.document.borrow_mut().clear();
        self.inner.elements.borrow_mut().clear();
        self.inner.controller.borrow_mut().unbind();
    }

    /// Load and start `track`, retrying once if autoplay is refused.
    pub fn load_track(&self, track: Track) {
        let outcome = self.inner.controller.borrow_mut().load_track(track);
        debug!("load_track: {outcome:?}");
        drive_play(&self.inner);
    }

    pub fn toggle_play_pause(&self) {
        self.inner.controller.borrow_mut().toggle_play_pause();
        drive_play(&self.inner);
    }

    pub fn close(&self) {
        self.inner.controller.borrow_mut().close();
    }

    pub fn is_playing(&self) -> bool {
        self.inner.controller.borrow().is_playing()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner.controller.borrow().current_track().cloned()
    }
}

// Bind (or rebind after a swap), retrying while the player elements are missing.
async fn setup(weak: Weak<GlobalInner>, after_navigation: bool) {
    loop {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let document = web_sys::window().and_then(|w| w.document());
        let media = document.as_ref().and_then(DomMedia::find);
        let view = document.as_ref().and_then(DomPlayerView::find);

        let bind = {
            let mut controller = inner.controller.borrow_mut();
            if after_navigation {
                controller.after_navigation(media, view)
            } else {
                controller.bind(media, view)
            }
        };

        match bind {
            Bind::Bound => {
                if let Err(err) = attach_listeners(&inner) {
                    warn!("player controls not wired: {err:?}");
                }
                return;
            }
            Bind::RetryAfter(ms) => {
                drop(inner);
                sleep_ms(ms as i32).await;
            }
        }
    }
}

fn attach_listeners(inner: &Rc<GlobalInner>) -> Result<(), JsValue> {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return Ok(());
    };
    let audio = {
        let controller = inner.controller.borrow();
        match controller.media() {
            Some(media) => media.element().clone(),
            None => return Ok(()),
        }
    };

    let mut listeners = Vec::new();

    listeners.push(on(inner, &audio, "loadedmetadata", |inner, _| {
        inner.controller.borrow_mut().on_metadata();
    })?);
    listeners.push(on(inner, &audio, "timeupdate", |inner, _| {
        inner.controller.borrow_mut().on_time_update(now_ms());
    })?);
    listeners.push(on(inner, &audio, "ended", |inner, _| {
        inner.controller.borrow_mut().on_ended();
    })?);
    listeners.push(on(inner, &audio, "canplay", |inner, _| {
        inner.controller.borrow_mut().on_ready();
        drive_play(inner);
    })?);

    if let Some(button) = document.get_element_by_id(PLAY_PAUSE_ID) {
        listeners.push(on(inner, &button, "click", |inner, _| {
            inner.controller.borrow_mut().toggle_play_pause();
            drive_play(inner);
        })?);
    }
    if let Some(slider) = document.get_element_by_id(PROGRESS_ID) {
        listeners.push(on(inner, &slider, "input", |inner, e| {
            if let Some(value) = input_value(e) {
                inner.controller.borrow_mut().seek_to(value);
            }
        })?);
    }
    if let Some(slider) = document.get_element_by_id(VOLUME_ID) {
        listeners.push(on(inner, &slider, "input", |inner, e| {
            if let Some(value) = input_value(e) {
                inner.controller.borrow_mut().set_volume(value);
            }
        })?);
    }
    if let Some(button) = document.get_element_by_id(CLOSE_ID) {
        listeners.push(on(inner, &button, "click", |inner, _| {
            inner.controller.borrow_mut().close();
        })?);
    }

    *inner.elements.borrow_mut() = listeners;
    Ok(())
}

fn on(
    inner: &Rc<GlobalInner>,
    target: &EventTarget,
    event: &'static str,
    action: fn(&Rc<GlobalInner>, &Event),
) -> Result<Listener, JsValue> {
    let weak = Rc::downgrade(inner);
    Listener::new(target, event, move |e| {
        if let Some(inner) = weak.upgrade() {
            action(&inner, &e);
        }
    })
}

fn input_value(event: &Event) -> Option<f64> {
    let input = event.target()?.dyn_into::<HtmlInputElement>().ok()?;
    Some(input.value_as_number()).filter(|v| v.is_finite())
}

// Await an in-flight play request without holding the controller borrow.
fn drive_play(inner: &Rc<GlobalInner>) {
    let promise = inner
        .controller
        .borrow_mut()
        .media_mut()
        .and_then(DomMedia::take_pending_play);
    let Some(promise) = promise else {
        return;
    };

    let weak = Rc::downgrade(inner);
    spawn_local(async move {
        let ok = JsFuture::from(promise).await.is_ok();
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let outcome = inner.controller.borrow_mut().on_play_resolved(ok);
        if outcome == Some(StartOutcome::NotStarted) {
            debug!("playback is waiting for a user gesture");
        }
        // A refusal after the media was ready retries right away.
        drive_play(&inner);
    });
}
