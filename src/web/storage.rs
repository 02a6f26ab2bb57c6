//! Web Storage backed key-value store.

use web_sys::Storage;

use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// `window.localStorage` or `window.sessionStorage`.
///
/// Storage can be missing or throw (private mode, disabled cookies); reads
/// then behave as empty and writes fail with [`StorageError`].
#[derive(Clone, Debug)]
pub struct BrowserStorage {
    storage: Option<Storage>,
}

impl BrowserStorage {
    pub fn local() -> Self {
        Self {
            storage: web_sys::window().and_then(|w| w.local_storage().ok().flatten()),
        }
    }

    pub fn session() -> Self {
        Self {
            storage: web_sys::window().and_then(|w| w.session_storage().ok().flatten()),
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage.set_item(key, value).map_err(|err| StorageError::Write {
            key: key.to_owned(),
            reason: format!("{err:?}"),
        })
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = self.storage.as_ref() {
            let _ = storage.remove_item(key);
        }
    }
}
