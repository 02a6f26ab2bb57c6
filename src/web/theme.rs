//! Theme controller bound to the document root.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, Element};

use super::{BrowserStorage, Listener};
use crate::observer::ListenerId;
use crate::theme::{Theme, ThemeController};

/// Theme controller applied to `<html>`.
///
/// Sets `data-theme` and the `theme-*` class, follows the OS colour scheme
/// until the user picks a theme, and adopts `theme-restored` events.
pub struct DomTheme {
    controller: Rc<RefCell<ThemeController<BrowserStorage>>>,
    _listeners: Vec<Listener>,
}

impl DomTheme {
    pub fn init() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window available")?;
        let document = window.document().ok_or("No document available")?;
        let root = document
            .document_element()
            .ok_or("No document element available")?;

        let current = root.get_attribute("data-theme");
        let mut controller = ThemeController::new(current.as_deref(), BrowserStorage::local());
        controller.subscribe(move |theme: &Theme| apply_to(&root, *theme));
        let controller = Rc::new(RefCell::new(controller));

        let mut listeners = Vec::new();
        if let Ok(Some(query)) = window.match_media("(prefers-color-scheme: dark)") {
            let weak = Rc::downgrade(&controller);
            let media = query.clone();
            listeners.push(Listener::new(&query, "change", move |_| {
                if let Some(controller) = weak.upgrade() {
                    controller.borrow_mut().on_system_preference(media.matches());
                }
            })?);
        }

        let weak = Rc::downgrade(&controller);
        listeners.push(Listener::new(&document, "theme-restored", move |event| {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            let restored = event
                .dyn_ref::<CustomEvent>()
                .and_then(|e| js_sys::Reflect::get(&e.detail(), &"theme".into()).ok())
                .and_then(|v| v.as_string())
                .and_then(|name| name.parse::<Theme>().ok());
            if let Some(theme) = restored {
                controller.borrow_mut().on_restored(theme);
            }
        })?);

        Ok(Self {
            controller,
            _listeners: listeners,
        })
    }

    pub fn theme(&self) -> Theme {
        self.controller.borrow().theme()
    }

    pub fn toggle(&self) -> Theme {
        self.controller.borrow_mut().toggle()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.controller.borrow_mut().set_theme(theme);
    }

    pub fn subscribe<F>(&self, callback: F) -> ListenerId
    where
        F: FnMut(&Theme) + 'static,
    {
        self.controller.borrow_mut().subscribe(callback)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.controller.borrow_mut().unsubscribe(id)
    }
}

fn apply_to(root: &Element, theme: Theme) {
    let _ = root.set_attribute("data-theme", theme.name());
    let classes = root.class_list();
    let _ = classes.remove_2(Theme::Dark.class_name(), Theme::Light.class_name());
    let _ = classes.add_1(theme.class_name());
}
