//! Browser bindings: DOM surfaces, a `requestAnimationFrame` driver, the
//! `<audio>` player and Web Storage.

mod audio;
mod bindings;
mod driver;
mod storage;
mod surface;
mod theme;

pub use audio::{DomMedia, DomPlayerView, GlobalAudio};
pub use bindings::{
    init_effects, load_global_track, start_ascii_background, stop_ascii_backgrounds,
    teardown_effects, toggle_theme,
};
pub use driver::AnimatorDriver;
pub use storage::BrowserStorage;
pub use surface::ElementSurface;
pub use theme::DomTheme;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, EventTarget};

/// Route the `log` facade to the browser console.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: log::Level) {
    let _ = console_log::init_with_level(level);
}

/// High-resolution timestamp in milliseconds.
///
/// Falls back to `Date.now()` when the Performance API is missing.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// A seed for the animator RNG.
pub fn entropy_seed() -> u64 {
    let random = (js_sys::Math::random() * (1u64 << 53) as f64) as u64;
    random ^ (js_sys::Date::now() as u64).rotate_left(32)
}

/// Resolve after `ms` milliseconds on the browser event loop.
pub async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        } else {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// An event listener removed from its target when dropped.
pub(crate) struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub(crate) fn new<F>(target: &EventTarget, event: &'static str, callback: F) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}
