//! JavaScript entry points.
//!
//! One explicitly initialised set of effects per page context: the audio
//! player, the theme and any number of animated backgrounds.

use std::cell::RefCell;

use log::{info, Level};
use wasm_bindgen::prelude::*;

use super::{init_logging, AnimatorDriver, DomTheme, GlobalAudio, Listener};
use crate::config::EffectsConfig;
use crate::playback::Track;

#[derive(Default)]
struct Effects {
    audio: Option<GlobalAudio>,
    theme: Option<DomTheme>,
    backgrounds: Vec<AnimatorDriver>,
    navigation: Option<Listener>,
}

thread_local! {
    static EFFECTS: RefCell<Option<Effects>> = const { RefCell::new(None) };
}

fn parse_config(config_json: Option<String>) -> Result<EffectsConfig, JsValue> {
    match config_json {
        Some(json) => EffectsConfig::from_json_str(&json).map_err(|e| JsValue::from_str(&e.to_string())),
        None => Ok(EffectsConfig::default()),
    }
}

/// Install logging, the audio player and the theme controller.
///
/// `config_json` is an optional JSON [`EffectsConfig`].
#[wasm_bindgen(js_name = initEffects)]
pub fn init_effects(config_json: Option<String>) -> Result<(), JsValue> {
    init_logging(Level::Info);
    let config = parse_config(config_json)?;

    let initialised = EFFECTS.with(|e| e.borrow().as_ref().is_some_and(|fx| fx.audio.is_some()));
    if initialised {
        return Ok(());
    }

    let audio = GlobalAudio::init(config.audio)?;
    let theme = DomTheme::init()?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("No document available")?;
    let navigation = Listener::new(&document, "astro:before-swap", |_| {
        EFFECTS.with(|e| {
            if let Some(effects) = e.borrow().as_ref() {
                for background in &effects.backgrounds {
                    background.trigger_page_transition();
                }
            }
        });
    })?;

    EFFECTS.with(|e| {
        let mut slot = e.borrow_mut();
        let effects = slot.get_or_insert_with(Effects::default);
        effects.audio = Some(audio);
        effects.theme = Some(theme);
        effects.navigation = Some(navigation);
    });
    info!("effects initialised");
    Ok(())
}

/// Animate the element with `element_id` as an ASCII background.
#[wasm_bindgen(js_name = startAsciiBackground)]
pub fn start_ascii_background(element_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    let config = parse_config(config_json)?;
    let driver = AnimatorDriver::by_id(element_id, config.animator);
    driver.start()?;
    EFFECTS.with(|e| {
        e.borrow_mut()
            .get_or_insert_with(Effects::default)
            .backgrounds
            .push(driver);
    });
    Ok(())
}

/// Stop and drop every animated background.
#[wasm_bindgen(js_name = stopAsciiBackgrounds)]
pub fn stop_ascii_backgrounds() {
    let backgrounds = EFFECTS.with(|e| {
        e.borrow_mut()
            .as_mut()
            .map(|effects| std::mem::take(&mut effects.backgrounds))
    });
    drop(backgrounds);
}

/// Load and start a track in the global player.
#[wasm_bindgen(js_name = loadGlobalTrack)]
pub fn load_global_track(url: String, title: Option<String>, artist: Option<String>) {
    let audio = EFFECTS.with(|e| e.borrow().as_ref().and_then(|fx| fx.audio.clone()));
    match audio {
        Some(audio) => audio.load_track(Track { url, title, artist }),
        None => log::error!("global audio player not initialised"),
    }
}

/// Flip the theme; returns the new theme name.
#[wasm_bindgen(js_name = toggleTheme)]
pub fn toggle_theme() -> Option<String> {
    EFFECTS.with(|e| {
        e.borrow()
            .as_ref()
            .and_then(|fx| fx.theme.as_ref())
            .map(|theme| theme.toggle().name().to_owned())
    })
}

/// Release every listener, background and the audio player.
#[wasm_bindgen(js_name = teardownEffects)]
pub fn teardown_effects() {
    let effects = EFFECTS.with(|e| e.borrow_mut().take());
    if let Some(mut effects) = effects {
        effects.navigation.take();
        effects.backgrounds.clear();
        if let Some(audio) = effects.audio.take() {
            audio.teardown();
        }
    }
}
