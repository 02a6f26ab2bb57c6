//! Dark/light theme preference.

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::observer::{ListenerId, Observers};
use crate::storage::{keys, KeyValueStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Class set on the document root, e.g. `theme-dark`.
    pub fn class_name(self) -> &'static str {
        match self {
            Theme::Dark => "theme-dark",
            Theme::Light => "theme-light",
        }
    }

    #[inline]
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(()),
        }
    }
}

/// Owns the current theme and broadcasts every change.
///
/// Subscribers apply the theme (the web binding sets `data-theme` and the
/// `theme-*` class on the document root); they are called immediately with
/// the current theme on registration.
pub struct ThemeController<K: KeyValueStore> {
    theme: Theme,
    store: K,
    observers: Observers<Theme>,
}

impl<K: KeyValueStore> ThemeController<K> {
    /// Pick the theme already on the document, then the stored preference,
    /// then dark.
    pub fn new(document_theme: Option<&str>, store: K) -> Self {
        let theme = document_theme
            .and_then(|t| t.parse().ok())
            .or_else(|| stored_theme(&store))
            .unwrap_or_default();
        Self {
            theme,
            store,
            observers: Observers::new(),
        }
    }

    #[inline]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[inline]
    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn has_stored_preference(&self) -> bool {
        stored_theme(&self.store).is_some()
    }

    /// Flip the theme and remember the choice.
    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.persist();
        self.apply();
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.theme {
            return;
        }
        self.theme = theme;
        self.persist();
        self.apply();
    }

    /// Follow the OS colour scheme unless the user chose a theme.
    pub fn on_system_preference(&mut self, prefers_dark: bool) -> bool {
        if self.has_stored_preference() {
            return false;
        }
        self.theme = if prefers_dark { Theme::Dark } else { Theme::Light };
        self.apply();
        true
    }

    /// Adopt a theme the page restored on its own (after a navigation).
    pub fn on_restored(&mut self, theme: Theme) {
        if theme != self.theme {
            self.theme = theme;
            self.apply();
        }
    }

    /// Broadcast the current theme.
    pub fn apply(&mut self) {
        self.observers.notify(&self.theme);
    }

    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&Theme) + 'static,
    {
        self.observers.subscribe(&self.theme, callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.set(keys::THEME, self.theme.name()) {
            warn!("theme preference not saved: {err}");
        }
    }
}

fn stored_theme<K: KeyValueStore + ?Sized>(store: &K) -> Option<Theme> {
    store.get(keys::THEME)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_initial_theme_precedence() {
        let stored = MemoryStore::new().with_entry(keys::THEME, "light");
        assert_eq!(ThemeController::new(Some("dark"), stored.clone()).theme(), Theme::Dark);
        assert_eq!(ThemeController::new(None, stored).theme(), Theme::Light);
        assert_eq!(ThemeController::new(Some("sepia"), MemoryStore::new()).theme(), Theme::Dark);
    }

    #[test]
    fn test_toggle_persists_and_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut themes = ThemeController::new(None, MemoryStore::new());
        let sink = Rc::clone(&seen);
        themes.subscribe(move |t: &Theme| sink.borrow_mut().push(*t));

        assert_eq!(themes.toggle(), Theme::Light);
        themes.set_theme(Theme::Light);
        themes.set_theme(Theme::Dark);

        assert_eq!(*seen.borrow(), vec![Theme::Dark, Theme::Light, Theme::Dark]);
        assert_eq!(themes.store().get(keys::THEME).as_deref(), Some("dark"));
    }

    #[test]
    fn test_system_preference_only_without_choice() {
        let mut themes = ThemeController::new(None, MemoryStore::new());
        assert!(themes.on_system_preference(false));
        assert_eq!(themes.theme(), Theme::Light);

        themes.toggle();
        assert!(!themes.on_system_preference(false));
        assert_eq!(themes.theme(), Theme::Dark);
    }

    #[test]
    fn test_restored_theme() {
        let mut themes = ThemeController::new(None, MemoryStore::new());
        themes.on_restored(Theme::Light);
        assert_eq!(themes.theme(), Theme::Light);
        assert!(!themes.has_stored_preference());
    }
}
