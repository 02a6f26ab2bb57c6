//! Key-value storage seam and JSON helpers.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage key names shared with the page scripts.
pub mod keys {
    /// Long-lived volume percentage
    pub const VOLUME: &str = "globalAudioVolume";
    /// Long-lived playback state
    pub const PLAYBACK: &str = "globalAudioState";
    /// Short-lived snapshot written around a full-page navigation
    pub const TRANSITION: &str = "globalAudioTransitionState";
    /// Theme preference
    pub const THEME: &str = "theme";
}

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("failed to write `{key}`: {reason}")]
    Write { key: String, reason: String },
    #[error("failed to serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse `{key}`: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A string key-value store (browser local/session storage or in-memory).
///
/// Reads never fail: an unreadable store behaves like an empty one.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&mut self, key: &str);
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    /// Reject every write, like a browser with storage disabled or full
    pub read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::Write {
                key: key.to_owned(),
                reason: "store is read-only".to_owned(),
            });
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Read and parse a JSON value. Absent keys are `Ok(None)`.
pub fn read_json<T, K>(store: &K, key: &str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
    K: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Parse {
            key: key.to_owned(),
            source,
        })
}

/// Serialize `value` as JSON under `key`.
pub fn write_json<T, K>(store: &mut K, key: &str, value: &T) -> StorageResult<()>
where
    T: Serialize + ?Sized,
    K: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Sample {
        a: u32,
    }

    #[test]
    fn test_json_round_trip_and_absent_key() {
        let mut store = MemoryStore::new();
        assert!(read_json::<Sample, _>(&store, "k").unwrap().is_none());

        write_json(&mut store, "k", &Sample { a: 3 }).unwrap();
        assert_eq!(store.get("k").as_deref(), Some(r#"{"a":3}"#));
        assert_eq!(read_json::<Sample, _>(&store, "k").unwrap(), Some(Sample { a: 3 }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let store = MemoryStore::new().with_entry("k", "{not json");
        let err = read_json::<Sample, _>(&store, "k").unwrap_err();
        assert!(matches!(err, StorageError::Parse { ref key, .. } if key == "k"));
        assert!(err.to_string().starts_with("failed to parse `k`"));
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let mut store = MemoryStore {
            read_only: true,
            ..MemoryStore::default()
        };
        assert!(matches!(
            store.set("k", "v"),
            Err(StorageError::Write { .. })
        ));
        assert!(store.is_empty());
    }
}
