//! Audio state persistence over long-lived and short-lived stores.

use log::{debug, warn};

use crate::playback::{PlaybackState, TransitionSnapshot};
use crate::storage::{self, keys, KeyValueStore, StorageResult};

/// Reads and writes the player's persisted state.
///
/// `local` outlives the browsing session (browser local storage); `session`
/// holds the navigation snapshot (browser session storage). Readers tolerate
/// absent or malformed entries: they log and return `None`.
#[derive(Clone, Debug)]
pub struct AudioStateStore<K: KeyValueStore> {
    local: K,
    session: K,
}

impl<K: KeyValueStore> AudioStateStore<K> {
    pub fn new(local: K, session: K) -> Self {
        Self { local, session }
    }

    #[inline]
    pub fn local(&self) -> &K {
        &self.local
    }

    #[inline]
    pub fn session(&self) -> &K {
        &self.session
    }

    #[inline]
    pub fn local_mut(&mut self) -> &mut K {
        &mut self.local
    }

    #[inline]
    pub fn session_mut(&mut self) -> &mut K {
        &mut self.session
    }

    pub fn into_inner(self) -> (K, K) {
        (self.local, self.session)
    }

    pub fn save_playback(&mut self, state: &PlaybackState) -> StorageResult<()> {
        storage::write_json(&mut self.local, keys::PLAYBACK, state)
    }

    pub fn load_playback(&self) -> Option<PlaybackState> {
        storage::read_json(&self.local, keys::PLAYBACK)
            .unwrap_or_else(|err| {
                warn!("skipping playback restore: {err}");
                None
            })
    }

    pub fn save_transition(&mut self, snapshot: &TransitionSnapshot) -> StorageResult<()> {
        storage::write_json(&mut self.session, keys::TRANSITION, snapshot)?;
        debug!("transition snapshot saved for {}", snapshot.track.url);
        Ok(())
    }

    pub fn load_transition(&self) -> Option<TransitionSnapshot> {
        storage::read_json(&self.session, keys::TRANSITION)
            .unwrap_or_else(|err| {
                warn!("skipping transition restore: {err}");
                None
            })
    }

    /// Read the snapshot and remove it, so it is applied at most once.
    pub fn take_transition(&mut self) -> Option<TransitionSnapshot> {
        let snapshot = self.load_transition();
        self.session.remove(keys::TRANSITION);
        snapshot
    }

    #[inline]
    pub fn has_transition(&self) -> bool {
        self.session.get(keys::TRANSITION).is_some()
    }

    /// Persist the volume as a plain percentage.
    pub fn save_volume(&mut self, percent: f64) -> StorageResult<()> {
        self.local.set(keys::VOLUME, &percent.to_string())
    }

    pub fn load_volume(&self) -> Option<f64> {
        let raw = self.local.get(keys::VOLUME)?;
        match raw.trim().parse::<f64>() {
            Ok(percent) if percent.is_finite() => Some(percent),
            _ => {
                warn!("ignoring stored volume {raw:?}");
                None
            }
        }
    }

    /// Forget the playback state and any pending snapshot. The volume stays.
    pub fn clear(&mut self) {
        self.local.remove(keys::PLAYBACK);
        self.session.remove(keys::TRANSITION);
    }
}
