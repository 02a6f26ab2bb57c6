#![cfg(all(target_arch = "wasm32", feature = "web"))]

use folio_ambience::storage::keys;
use folio_ambience::web::{AnimatorDriver, BrowserStorage, ElementSurface};
use folio_ambience::{
    AnimatorOptions, AudioStateStore, KeyValueStore, PatternKind, TextSurface, Track,
};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn element() -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let element: HtmlElement = document.create_element("pre").unwrap().dyn_into().unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    element
}

#[wasm_bindgen_test]
fn browser_storage_round_trip() {
    let mut local = BrowserStorage::local();
    assert!(local.is_available());
    local.set("folio-test", "42").unwrap();
    assert_eq!(local.get("folio-test").as_deref(), Some("42"));
    local.remove("folio-test");
    assert_eq!(local.get("folio-test"), None);
}

#[wasm_bindgen_test]
fn volume_survives_in_local_storage() {
    let mut store = AudioStateStore::new(BrowserStorage::local(), BrowserStorage::session());
    store.save_volume(40.0).unwrap();
    assert_eq!(BrowserStorage::local().get(keys::VOLUME).as_deref(), Some("40"));
    assert_eq!(store.load_volume(), Some(40.0));
    store.local_mut().remove(keys::VOLUME);
}

#[wasm_bindgen_test]
fn transition_snapshot_lives_in_session_storage() {
    let mut store = AudioStateStore::new(BrowserStorage::local(), BrowserStorage::session());
    let snapshot = folio_ambience::TransitionSnapshot {
        track: Track::new("a.mp3", "T", "A"),
        current_time: 12.5,
        duration: 60.0,
        is_playing: true,
        volume: 0.5,
        visible: true,
        was_playing: true,
    };
    store.save_transition(&snapshot).unwrap();
    assert!(BrowserStorage::session().get(keys::TRANSITION).is_some());
    assert_eq!(store.take_transition(), Some(snapshot));
    assert!(!store.has_transition());
}

#[wasm_bindgen_test]
fn element_surface_writes_text() {
    let mut surface = ElementSurface::new(element());
    surface.set_text(".:;+\n*%@#\n");
    assert_eq!(surface.element().text_content().as_deref(), Some(".:;+\n*%@#\n"));
}

#[wasm_bindgen_test]
fn driver_without_element_is_inert() {
    let driver = AnimatorDriver::by_id("no-such-background", AnimatorOptions::default());
    driver.start().unwrap();
    assert!(!driver.is_running());
    assert!(driver.with_animator(|a| a.is_inert()));
}

#[wasm_bindgen_test]
fn driver_starts_and_stops() {
    let driver = AnimatorDriver::new(Some(element()), AnimatorOptions::default());
    driver.start().unwrap();
    assert!(driver.is_running());
    driver.stop();
    assert!(!driver.is_running());
}

#[wasm_bindgen_test]
fn driver_listener_can_call_back_into_the_driver() {
    let options = AnimatorOptions {
        pattern: PatternKind::Waves,
        ..AnimatorOptions::default()
    };
    let driver = Rc::new(AnimatorDriver::new(Some(element()), options));
    let calls = Rc::new(Cell::new(0));

    let handle = Rc::downgrade(&driver);
    let seen = Rc::clone(&calls);
    driver.subscribe(move |status| {
        seen.set(seen.get() + 1);
        if status.pattern != PatternKind::Waves {
            if let Some(driver) = handle.upgrade() {
                driver.set_pattern(PatternKind::Waves);
            }
        }
    });

    driver.set_pattern(PatternKind::Grid);
    assert_eq!(driver.with_animator(|a| a.pattern()), PatternKind::Waves);
    // Initial call, the grid switch, then the switch back.
    assert_eq!(calls.get(), 3);
}
